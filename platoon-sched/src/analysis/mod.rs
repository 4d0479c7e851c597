/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedulability analysis of the leader and follower task sets.
//!
//! [`SchedulabilityAnalyzer`] drives the whole pipeline for one system:
//!
//! ```text
//! MeasurementStore ─┐
//! SystemTopology ───┼─► build_task_set ─► TaskSet ─┬─► utilization / edf_test ─┐
//! MarginPolicy ─────┘                              └─► rta::response_time ─────┴─► SystemReport
//! ```
//!
//! Systems are analysed independently: each runs on its own core and there is
//! no cross-system interference.  A missing measurement aborts only the
//! affected system.
//!
//! # Example
//! ```rust,ignore
//! let analyzer = SchedulabilityAnalyzer::new(Arc::new(store), MarginPolicy::default());
//! let report = analyzer.analyze_system(&Topology::builtin(), System::Follower)?;
//! ```

pub mod error;
pub mod rta;
pub mod utilization;

pub use error::AnalysisError;
pub use rta::{NumericDivergence, ResponseTime};
pub use utilization::{DeadlineModel, EdfTest, EdfVerdict};

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{MarginPolicy, MeasurementStore, Topology};
use crate::task::System;
use crate::taskset::{build_task_set, CostedTask, TaskSet};

use utilization::{edf_test, liu_layland_bound};

// ── Options ───────────────────────────────────────────────────────────────────

/// Which parts of the analysis to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Run the fixed-priority response-time analysis.  When `false`, the
    /// per-task response time and verdict are reported as "not computed".
    pub run_rta: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { run_rta: true }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Per-task analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub system: System,
    pub name: String,
    pub components: String,
    pub observed_us: f64,
    pub margin: f64,
    pub cost_ms: f64,
    pub period_ms: f64,
    pub deadline_ms: f64,
    pub priority: i32,
    pub utilization: f64,

    /// `None` when RTA was not requested.
    pub response_time_ms: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence: Option<NumericDivergence>,

    /// `None` when RTA was not requested.
    pub schedulable: Option<bool>,
}

/// Per-system analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemReport {
    pub system: System,

    /// Ordered by priority, ties broken by task name.
    pub tasks: Vec<TaskReport>,

    /// Optional tasks left out for lack of measurements.
    pub omitted: Vec<String>,

    pub total_utilization: f64,
    pub edf: EdfTest,

    /// Liu & Layland bound for this task count (informational).
    pub rm_utilization_bound: f64,

    /// `None` when RTA was not requested.
    pub all_schedulable: Option<bool>,
}

impl SystemReport {
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

// ── SchedulabilityAnalyzer ────────────────────────────────────────────────────

/// Schedulability analyzer over one immutable measurement store.
///
/// Holds no per-run state, so a single instance can analyse any number of
/// systems, sequentially or from several threads.
pub struct SchedulabilityAnalyzer {
    store: Arc<MeasurementStore>,
    policy: MarginPolicy,
    options: AnalysisOptions,
}

impl SchedulabilityAnalyzer {
    pub fn new(store: Arc<MeasurementStore>, policy: MarginPolicy) -> Self {
        for warning in policy.validate() {
            warn!("margin policy: {warning}");
        }
        Self {
            store,
            policy,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(self, options: AnalysisOptions) -> Self {
        Self { options, ..self }
    }

    // ── Public entry points ───────────────────────────────────────────────────

    /// Build and analyse the task set of `system`.
    ///
    /// # Errors
    /// * [`AnalysisError::SystemNotInTopology`] if `topology` has no table for
    ///   `system`.
    /// * [`AnalysisError::MissingMeasurement`] if a required component has no
    ///   sample.
    pub fn analyze_system(
        &self,
        topology: &Topology,
        system: System,
    ) -> Result<SystemReport, AnalysisError> {
        let table = topology
            .system(system)
            .ok_or(AnalysisError::SystemNotInTopology { system })?;

        info!(
            system = %system,
            templates = table.tasks.len(),
            samples = self.store.len(),
            "=== schedulability analysis ==="
        );

        let set = build_task_set(table, &self.store, &self.policy)?;
        Ok(self.analyze_task_set(&set))
    }

    /// Analyse every system in `topology`, leader first.
    ///
    /// A failure in one system does not prevent the others from being
    /// analysed.
    pub fn analyze_all(
        &self,
        topology: &Topology,
    ) -> Vec<(System, Result<SystemReport, AnalysisError>)> {
        topology
            .systems()
            .map(|t| (t.system, self.analyze_system(topology, t.system)))
            .collect()
    }

    /// Run the utilisation test and (optionally) RTA on an already built
    /// task set.
    pub fn analyze_task_set(&self, set: &TaskSet) -> SystemReport {
        let tasks = set.tasks();
        let edf = edf_test(&tasks);

        // Pair results with tasks by position; names are not guaranteed unique
        // for a task set built in code.
        let mut ordered: Vec<&CostedTask> = set.tasks.iter().collect();
        ordered.sort_by(|a, b| a.task.priority_order(&b.task));

        let reports: Vec<TaskReport> = ordered
            .into_iter()
            .map(|c| {
                let rt = self
                    .options
                    .run_rta
                    .then(|| rta::response_time(&c.task, &tasks));
                TaskReport {
                    system: set.system,
                    name: c.task.name.clone(),
                    components: c.components.clone(),
                    observed_us: c.observed_us,
                    margin: c.margin,
                    cost_ms: c.task.cost_ms,
                    period_ms: c.task.period_ms,
                    deadline_ms: c.task.deadline_ms,
                    priority: c.task.priority,
                    utilization: c.task.utilization(),
                    response_time_ms: rt.as_ref().map(|r| r.response_time_ms),
                    divergence: rt.as_ref().and_then(|r| r.divergence),
                    schedulable: rt.as_ref().map(|r| r.schedulable),
                }
            })
            .collect();

        for t in &reports {
            match t.schedulable {
                Some(true) => info!(
                    system = %set.system,
                    task = %t.name,
                    prio = t.priority,
                    cost_ms = t.cost_ms,
                    response_ms = t.response_time_ms,
                    deadline_ms = t.deadline_ms,
                    "✓ schedulable"
                ),
                Some(false) => warn!(
                    system = %set.system,
                    task = %t.name,
                    prio = t.priority,
                    cost_ms = t.cost_ms,
                    response_ms = t.response_time_ms,
                    deadline_ms = t.deadline_ms,
                    "✗ deadline may be missed"
                ),
                None => info!(
                    system = %set.system,
                    task = %t.name,
                    prio = t.priority,
                    cost_ms = t.cost_ms,
                    utilization = t.utilization,
                    "costed (RTA not requested)"
                ),
            }
        }

        let all_schedulable = self
            .options
            .run_rta
            .then(|| reports.iter().all(|t| t.schedulable == Some(true)));

        let report = SystemReport {
            system: set.system,
            tasks: reports,
            omitted: set.omitted.clone(),
            total_utilization: edf.utilization,
            edf,
            rm_utilization_bound: liu_layland_bound(tasks.len()),
            all_schedulable,
        };

        info!(
            system = %report.system,
            task_count = report.tasks.len(),
            utilization = report.total_utilization,
            rm_bound = report.rm_utilization_bound,
            edf = %report.edf.verdict,
            all_schedulable = ?report.all_schedulable,
            "=== analysis complete ==="
        );
        if report.edf.verdict == EdfVerdict::NecessaryOnly {
            warn!(
                system = %report.system,
                "constrained deadlines: U ≤ 1 is necessary but not sufficient under EDF"
            );
        }

        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
