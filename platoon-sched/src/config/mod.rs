/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Analysis inputs: margin policy, measured samples and the task topology.
//!
//! The measurement file is a structured YAML rendition of the WCET counters
//! printed by the leader and follower processes:
//! ```yaml
//! samples:
//!   "L1 tick-producer iter":
//!     count: 1140
//!     max_us: 426.0
//!     avg_us: 120.5
//!   "F5 EVT_EMERGENCY": { count: 3, max_us: 851.0, avg_us: 610.2 }
//! ```
//!
//! The topology table lives in [`topology`].

pub mod topology;

pub use topology::{ComponentRef, SystemTopology, TaskTemplate, Topology};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::task::ObservedSample;

// ── Margin policy ─────────────────────────────────────────────────────────────

/// Default margin for well-sampled code paths.
pub const DEFAULT_MARGIN: f64 = 2.0;

/// Margin for rarely observed code paths (e.g. emergency handling).
pub const DEFAULT_RARE_MARGIN: f64 = 3.0;

/// Samples observed fewer times than this are treated as rare.
pub const DEFAULT_RARE_THRESHOLD: u64 = 100;

/// Tunable parameters that turn an observed maximum into an analysis cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginPolicy {
    pub default_margin: f64,
    pub rare_margin: f64,
    pub rare_threshold: u64,
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self {
            default_margin: DEFAULT_MARGIN,
            rare_margin: DEFAULT_RARE_MARGIN,
            rare_threshold: DEFAULT_RARE_THRESHOLD,
        }
    }
}

impl MarginPolicy {
    /// Sanity-check the policy.
    ///
    /// Returns human-readable warnings; an odd policy is still usable, the
    /// caller decides whether to log and continue.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.rare_margin < self.default_margin {
            warnings.push(format!(
                "rare margin {} is below default margin {}; rarely observed paths get less headroom",
                self.rare_margin, self.default_margin
            ));
        }
        if self.default_margin < 1.0 {
            warnings.push(format!(
                "default margin {} deflates observed maxima",
                self.default_margin
            ));
        }
        if self.rare_margin < 1.0 {
            warnings.push(format!(
                "rare margin {} deflates observed maxima",
                self.rare_margin
            ));
        }
        if self.rare_threshold == 0 {
            warnings.push("rare threshold is 0; rare margin is never applied".to_string());
        }
        warnings
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SampleFile {
    #[serde(default)]
    samples: BTreeMap<String, SampleEntry>,
}

#[derive(Debug, Deserialize)]
struct SampleEntry {
    count: u64,
    max_us: f64,
    #[serde(default)]
    avg_us: f64,
}

// ── MeasurementStore ──────────────────────────────────────────────────────────

/// Read-only map of measurement label → [`ObservedSample`].
///
/// `BTreeMap` keeps labels sorted, so the "available labels" listed in a
/// missing-measurement error are deterministic.
#[derive(Debug, Default, Clone)]
pub struct MeasurementStore {
    samples: BTreeMap<String, ObservedSample>,

    /// Set to `true` after a successful [`load_from_file`](Self::load_from_file).
    loaded: bool,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store directly from samples (keyed by their label).
    pub fn from_samples(samples: impl IntoIterator<Item = ObservedSample>) -> Self {
        let mut store = Self::new();
        for sample in samples {
            store.insert(sample);
        }
        store
    }

    /// Parses `path` and replaces all previously loaded samples.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML does not match
    /// the expected layout.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        info!("Loading measurement samples from: {}", path.display());

        self.samples.clear();
        self.loaded = false;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open measurement file: {}", path.display()))?;

        let file: SampleFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        for (label, entry) in file.samples {
            debug!(
                "  Sample: {} | count={} | max={:.3}us | avg={:.3}us",
                label, entry.count, entry.max_us, entry.avg_us
            );
            self.insert(ObservedSample::new(
                label,
                entry.count,
                entry.max_us,
                entry.avg_us,
            ));
        }

        if self.samples.is_empty() {
            warn!("No samples found in {}", path.display());
        }

        self.loaded = true;
        info!("Loaded {} measurement sample(s)", self.samples.len());
        Ok(())
    }

    /// Insert or replace a sample.
    pub fn insert(&mut self, sample: ObservedSample) {
        self.samples.insert(sample.label.clone(), sample);
    }

    pub fn get(&self, label: &str) -> Option<&ObservedSample> {
        self.samples.get(label)
    }

    /// All labels, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.samples.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns `true` after a successful call to [`load_from_file`](Self::load_from_file).
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── MarginPolicy ──────────────────────────────────────────────────────────

    #[test]
    fn default_policy_matches_measurement_campaign() {
        let p = MarginPolicy::default();
        assert_eq!(p.default_margin, 2.0);
        assert_eq!(p.rare_margin, 3.0);
        assert_eq!(p.rare_threshold, 100);
        assert!(p.validate().is_empty());
    }

    #[test]
    fn rare_margin_below_default_is_warned() {
        let p = MarginPolicy {
            rare_margin: 1.5,
            ..Default::default()
        };
        let w = p.validate();
        assert_eq!(w.len(), 1);
        assert!(w[0].contains("below default margin"));
    }

    #[test]
    fn zero_threshold_is_warned() {
        let p = MarginPolicy {
            rare_threshold: 0,
            ..Default::default()
        };
        assert!(p.validate().iter().any(|w| w.contains("never applied")));
    }

    // ── MeasurementStore: load_from_file ──────────────────────────────────────

    #[test]
    fn load_sample_yaml() {
        let yaml = r#"
samples:
  "L1 tick-producer iter":
    count: 1140
    max_us: 426.0
    avg_us: 120.5
  "L4 rx msg->event": { count: 12, max_us: 66.7, avg_us: 40.0 }
"#;
        let f = yaml_tempfile(yaml);
        let mut store = MeasurementStore::new();
        store.load_from_file(f.path()).unwrap();

        assert!(store.is_loaded());
        assert_eq!(store.len(), 2);

        let l1 = store.get("L1 tick-producer iter").unwrap();
        assert_eq!(l1.count, 1140);
        assert_eq!(l1.max_us, 426.0);
        assert_eq!(l1.avg_us, 120.5);

        let l4 = store.get("L4 rx msg->event").unwrap();
        assert_eq!(l4.label, "L4 rx msg->event");
        assert_eq!(l4.count, 12);
    }

    #[test]
    fn avg_defaults_to_zero_when_absent() {
        let f = yaml_tempfile("samples:\n  x: { count: 5, max_us: 10.0 }\n");
        let mut store = MeasurementStore::new();
        store.load_from_file(f.path()).unwrap();
        assert_eq!(store.get("x").unwrap().avg_us, 0.0);
    }

    #[test]
    fn labels_are_sorted() {
        let store = MeasurementStore::from_samples([
            ObservedSample::new("b", 1, 1.0, 1.0),
            ObservedSample::new("a", 1, 1.0, 1.0),
            ObservedSample::new("c", 1, 1.0, 1.0),
        ]);
        assert_eq!(store.labels(), vec!["a", "b", "c"]);
        assert!(!store.is_loaded(), "programmatic stores are not file-loaded");
    }

    #[test]
    fn empty_file_loads_empty_store() {
        let f = yaml_tempfile("samples: {}\n");
        let mut store = MeasurementStore::new();
        store.load_from_file(f.path()).unwrap();
        assert!(store.is_loaded());
        assert!(store.is_empty());
    }

    #[test]
    fn missing_file_returns_error() {
        let mut store = MeasurementStore::new();
        let result = store.load_from_file(Path::new("/nonexistent/path/samples.yaml"));
        assert!(result.is_err());
        assert!(!store.is_loaded());
    }

    #[test]
    fn sample_without_max_is_rejected() {
        let f = yaml_tempfile("samples:\n  x: { count: 5 }\n");
        let mut store = MeasurementStore::new();
        assert!(store.load_from_file(f.path()).is_err());
        assert!(!store.is_loaded());
    }

    #[test]
    fn reload_replaces_previous_samples() {
        let f1 = yaml_tempfile("samples:\n  a: { count: 1, max_us: 1.0 }\n");
        let f2 = yaml_tempfile("samples:\n  b: { count: 1, max_us: 1.0 }\n");

        let mut store = MeasurementStore::new();
        store.load_from_file(f1.path()).unwrap();
        assert!(store.get("a").is_some());

        store.load_from_file(f2.path()).unwrap();
        assert!(store.get("a").is_none(), "old sample must be gone");
        assert!(store.get("b").is_some());
    }
}
