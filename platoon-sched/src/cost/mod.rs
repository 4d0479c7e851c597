/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cost model: observed execution-time samples → analysis-grade task costs.
//!
//! # Margin policy
//! The maximum observed duration of a code path is only an estimate of its
//! WCET.  It is inflated by a multiplicative margin, and paths observed fewer
//! than `rare_threshold` times get the larger `rare_margin`:
//!
//! ```text
//! C_ms = (max_us / 1000) × margin,   margin = rare_margin   if count < rare_threshold
//!                                             default_margin otherwise
//! ```
//!
//! # Combination
//! A task whose job executes several measured components (e.g. UDP decode
//! followed by FSM handling) is charged the **sum** of the component costs
//! and reported with the **maximum** component margin.  This rule is a fixed
//! safety policy; do not replace it with anything less pessimistic.

use serde::Serialize;
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::config::{ComponentRef, MarginPolicy, MeasurementStore};
use crate::task::{ObservedSample, System};

/// Samples are recorded in µs, the task model is in ms.
pub const US_PER_MS: f64 = 1_000.0;

/// Separator between component labels in a combined label.
pub const LABEL_SEPARATOR: &str = "+";

// ── Margin selection & inflation ──────────────────────────────────────────────

/// Pick the margin for `sample`.
///
/// The boundary is inclusive on the "not rare" side: `count == rare_threshold`
/// uses `default_margin`.
pub fn select_margin(
    sample: &ObservedSample,
    default_margin: f64,
    rare_margin: f64,
    rare_threshold: u64,
) -> f64 {
    if sample.count < rare_threshold {
        rare_margin
    } else {
        default_margin
    }
}

/// Analysis cost in ms: `(max_us / 1000) × margin`.
pub fn inflate(sample: &ObservedSample, margin: f64) -> f64 {
    (sample.max_us / US_PER_MS) * margin
}

impl MarginPolicy {
    /// [`select_margin`] with this policy's parameters.
    pub fn margin_for(&self, sample: &ObservedSample) -> f64 {
        select_margin(
            sample,
            self.default_margin,
            self.rare_margin,
            self.rare_threshold,
        )
    }
}

// ── Component & combined costs ────────────────────────────────────────────────

/// Cost of one measured component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentCost {
    /// Label of the sample actually used (the fallback label if one was used).
    pub label: String,
    pub margin: f64,
    pub cost_ms: f64,
    /// Raw observed maximum in µs.
    pub observed_us: f64,
}

impl ComponentCost {
    pub fn from_sample(sample: &ObservedSample, policy: &MarginPolicy) -> Self {
        let margin = policy.margin_for(sample);
        let cost_ms = inflate(sample, margin);
        debug!(
            label = %sample.label,
            count = sample.count,
            max_us = sample.max_us,
            margin,
            cost_ms,
            "component cost"
        );
        Self {
            label: sample.label.clone(),
            margin,
            cost_ms,
            observed_us: sample.max_us,
        }
    }
}

/// Cost of a task assembled from one or more components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedCost {
    /// Component labels in order, joined with [`LABEL_SEPARATOR`].
    pub label: String,
    /// Largest component margin.
    pub margin: f64,
    /// Sum of component costs in ms.
    pub cost_ms: f64,
    /// Sum of raw observed maxima in µs (reporting only).
    pub observed_us: f64,
}

/// Combine components that run back to back within one job.
///
/// An empty slice yields an empty label, zero margin and zero cost.
pub fn combine(components: &[ComponentCost]) -> CombinedCost {
    let label = components
        .iter()
        .map(|c| c.label.as_str())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR);

    CombinedCost {
        label,
        margin: max_margin(components),
        cost_ms: components.iter().map(|c| c.cost_ms).sum(),
        observed_us: components.iter().map(|c| c.observed_us).sum(),
    }
}

/// Largest margin, `0.0` for no components.  A NaN margin wins, so a bad
/// input shows up in the report instead of being dropped.
fn max_margin(components: &[ComponentCost]) -> f64 {
    let Some((first, rest)) = components.split_first() else {
        return 0.0;
    };
    rest.iter().fold(first.margin, |max, c| {
        if c.margin.is_nan() || c.margin > max {
            c.margin
        } else {
            max
        }
    })
}

// ── Sample resolution ─────────────────────────────────────────────────────────

/// A sample found for a [`ComponentRef`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    pub sample: &'a ObservedSample,
    /// `true` if the exact label was absent and the fallback label matched.
    pub via_fallback: bool,
}

/// Look up `component`: exact label first, then its fallback label.
pub fn resolve<'a>(store: &'a MeasurementStore, component: &ComponentRef) -> Option<Resolved<'a>> {
    if let Some(sample) = store.get(&component.label) {
        return Some(Resolved {
            sample,
            via_fallback: false,
        });
    }
    component
        .fallback
        .as_deref()
        .and_then(|fb| store.get(fb))
        .map(|sample| Resolved {
            sample,
            via_fallback: true,
        })
}

/// [`resolve`], failing with [`AnalysisError::MissingMeasurement`] when
/// neither label was measured.
pub fn require<'a>(
    store: &'a MeasurementStore,
    component: &ComponentRef,
    system: System,
    task: &str,
) -> Result<Resolved<'a>, AnalysisError> {
    resolve(store, component).ok_or_else(|| AnalysisError::MissingMeasurement {
        system,
        task: task.to_string(),
        label: component.label.clone(),
        fallback: component.fallback.clone(),
        available: store.labels(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
