/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task-set builder.
//!
//! Binds cost-model outputs to one [`SystemTopology`] table.  The same
//! function builds the leader and the follower task sets; the per-task
//! `required` flag is the only thing that differs:
//!
//! * optional task, component not measured → task omitted (logged)
//! * required task, component not measured → [`AnalysisError::MissingMeasurement`]

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisError;
use crate::config::{MarginPolicy, MeasurementStore, SystemTopology};
use crate::cost::{self, combine, ComponentCost};
use crate::task::{System, Task};

/// A task together with the provenance of its cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostedTask {
    pub task: Task,

    /// Resolved component labels joined with `+`.
    pub components: String,

    /// Largest margin among the components.
    pub margin: f64,

    /// Sum of the raw observed maxima in µs.
    pub observed_us: f64,
}

/// Task set of one system, in topology order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSet {
    pub system: System,
    pub tasks: Vec<CostedTask>,

    /// Optional tasks left out because a component was not measured.
    pub omitted: Vec<String>,
}

impl TaskSet {
    /// Plain task records for the analyses.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.iter().map(|c| c.task.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&CostedTask> {
        self.tasks.iter().find(|c| c.task.name == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Build the task set described by `topology` from measured samples.
///
/// # Errors
/// [`AnalysisError::MissingMeasurement`] for the first component of a
/// required task that has neither its own nor its fallback sample.
pub fn build_task_set(
    topology: &SystemTopology,
    store: &MeasurementStore,
    policy: &MarginPolicy,
) -> Result<TaskSet, AnalysisError> {
    let system = topology.system;
    let mut tasks = Vec::with_capacity(topology.tasks.len());
    let mut omitted = Vec::new();

    'templates: for template in &topology.tasks {
        let mut components = Vec::with_capacity(template.components.len());

        for component in &template.components {
            let resolved = if template.required {
                Some(cost::require(store, component, system, &template.name)?)
            } else {
                cost::resolve(store, component)
            };

            let Some(resolved) = resolved else {
                warn!(
                    system = %system,
                    task = %template.name,
                    label = %component.label,
                    "optional task omitted: component not measured"
                );
                omitted.push(template.name.clone());
                continue 'templates;
            };

            if resolved.via_fallback {
                warn!(
                    system = %system,
                    task = %template.name,
                    label = %component.label,
                    fallback = %resolved.sample.label,
                    "component not measured, using fallback sample"
                );
            }
            components.push(ComponentCost::from_sample(resolved.sample, policy));
        }

        let combined = combine(&components);
        let task = Task::new(
            template.name.clone(),
            combined.cost_ms,
            template.period_ms,
            template.priority,
        )
        .with_deadline(template.deadline_ms);

        debug!(
            system = %system,
            task = %task.name,
            components = %combined.label,
            margin = combined.margin,
            cost_ms = task.cost_ms,
            "task costed"
        );

        tasks.push(CostedTask {
            task,
            components: combined.label,
            margin: combined.margin,
            observed_us: combined.observed_us,
        });
    }

    info!(
        system = %system,
        task_count = tasks.len(),
        omitted = omitted.len(),
        "task set built"
    );

    Ok(TaskSet {
        system,
        tasks,
        omitted,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
