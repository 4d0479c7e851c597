/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-priority response-time analysis (RTA).
//!
//! Preemptive fixed-priority scheduling of independent periodic tasks on one
//! dedicated core, without blocking.  The worst-case response time of task
//! `i` is the least fixed point of
//!
//! ```text
//! R_i = C_i + Σ_{j ∈ hp(i)} ⌈R_i / T_j⌉ · C_j
//! ```
//!
//! where `hp(i)` holds the tasks with a **strictly** higher priority (smaller
//! number).  Tasks sharing a priority level do not interfere with each other.
//!
//! The iteration starts at `R = C_i` and stops when two successive values
//! differ by less than [`CONVERGENCE_EPSILON`].  It is abandoned, and the
//! task declared unschedulable, once `R` exceeds
//! [`DIVERGENCE_FACTOR`]` × D_i` or after [`MAX_ITERATIONS`] steps.
//!
//! Each task's `hp(i)` depends only on priorities, never on another task's
//! computed `R`, so every task is analysed independently.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::task::Task;

/// Upper bound on fixed-point iterations per task.
pub const MAX_ITERATIONS: usize = 100;

/// Two successive iterates closer than this are considered equal.
pub const CONVERGENCE_EPSILON: f64 = 1e-9;

/// The iteration is abandoned once `R > DIVERGENCE_FACTOR × D`.
pub const DIVERGENCE_FACTOR: f64 = 10.0;

/// Why the fixed-point search for a task was abandoned.
///
/// This is a soft failure: the task is reported unschedulable, the analysis
/// of the remaining tasks continues.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericDivergence {
    /// The response time grew past `DIVERGENCE_FACTOR × D`.
    #[error("response time {response_time_ms:.3}ms exceeded divergence limit {limit_ms:.3}ms")]
    DeadlineGuard {
        response_time_ms: f64,
        limit_ms: f64,
    },

    /// No fixed point was reached within [`MAX_ITERATIONS`] steps.
    #[error("no fixed point after {iterations} iterations (last R = {response_time_ms:.3}ms)")]
    IterationCap {
        iterations: usize,
        response_time_ms: f64,
    },
}

/// RTA outcome for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTime {
    pub task: String,

    /// Converged response time, or the last iterate if the search diverged.
    pub response_time_ms: f64,

    /// Set when the fixed-point search was abandoned.
    pub divergence: Option<NumericDivergence>,

    /// `R ≤ D` and the search converged.
    pub schedulable: bool,

    /// Fixed-point steps taken.
    pub iterations: usize,
}

/// Worst-case response time of `task` against the interferers in `tasks`.
///
/// `tasks` may contain `task` itself; only strictly higher-priority entries
/// contribute interference.
pub fn response_time(task: &Task, tasks: &[Task]) -> ResponseTime {
    let hp: Vec<&Task> = tasks.iter().filter(|j| j.preempts(task)).collect();
    let limit_ms = DIVERGENCE_FACTOR * task.deadline_ms;

    let mut r = task.cost_ms;
    let mut divergence = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let interference: f64 = hp
            .iter()
            .map(|j| (r / j.period_ms).ceil() * j.cost_ms)
            .sum();
        let next = task.cost_ms + interference;

        if (next - r).abs() < CONVERGENCE_EPSILON {
            r = next;
            converged = true;
            break;
        }
        r = next;

        if r > limit_ms {
            divergence = Some(NumericDivergence::DeadlineGuard {
                response_time_ms: r,
                limit_ms,
            });
            break;
        }
    }

    if !converged && divergence.is_none() {
        divergence = Some(NumericDivergence::IterationCap {
            iterations,
            response_time_ms: r,
        });
    }

    let schedulable = divergence.is_none() && r <= task.deadline_ms;

    match &divergence {
        Some(d) => warn!(task = %task.name, "RTA diverged: {d}"),
        None => debug!(
            task = %task.name,
            interferers = hp.len(),
            iterations,
            response_time_ms = r,
            deadline_ms = task.deadline_ms,
            "RTA converged"
        ),
    }

    ResponseTime {
        task: task.name.clone(),
        response_time_ms: r,
        divergence,
        schedulable,
        iterations,
    }
}

/// Response times for every task, ordered by priority (ties by name).
pub fn analyze(tasks: &[Task]) -> Vec<ResponseTime> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| a.priority_order(b));
    ordered
        .into_iter()
        .map(|t| response_time(t, tasks))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
