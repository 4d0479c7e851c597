/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core task data structures for the schedulability analysis.
//!
//! ```text
//! ObservedSample ──(cost model)──►  Task  ──(analysis)──►  TaskReport
//!  µs, raw max                       ms, margin-inflated       verdicts
//! ```
//!
//! # Ownership model
//! A [`Task`] is built once per analysis run by the task-set builder and is
//! never mutated afterwards.  The utilisation test and the response-time
//! analysis only ever borrow `&[Task]`, so one task set can be analysed any
//! number of times (or from several threads) with identical results.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Two deadlines closer than this are considered equal.
pub const DEADLINE_TOLERANCE: f64 = 1e-9;

// ── System ────────────────────────────────────────────────────────────────────

/// One of the two independently analysed platoon processes.
///
/// Each system is pinned to its own CPU core, so there is no interference
/// between a leader task and a follower task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum System {
    Leader,
    Follower,
}

impl System {
    /// Lower-case name as used in YAML files and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            System::Leader => "leader",
            System::Follower => "follower",
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ObservedSample (input) ────────────────────────────────────────────────────

/// One measured execution-time statistic for a code path, in microseconds of
/// thread CPU time.
///
/// `max_us ≥ avg_us ≥ 0` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedSample {
    /// Identifier of the measured code path, e.g. `"F4 UDP msg->event"`.
    pub label: String,

    /// Number of observations behind `max_us` / `avg_us`.
    pub count: u64,

    /// Maximum observed duration in µs.
    pub max_us: f64,

    /// Average observed duration in µs (reporting only).
    pub avg_us: f64,
}

impl ObservedSample {
    pub fn new(label: impl Into<String>, count: u64, max_us: f64, avg_us: f64) -> Self {
        Self {
            label: label.into(),
            count,
            max_us,
            avg_us,
        }
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// A schedulable unit of work on one system.
///
/// All timing fields are in milliseconds.  `cost_ms` is already
/// margin-inflated by the cost model.
///
/// Values are **not** validated: a zero period or a negative cost simply
/// propagates into the analysis results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Unique task name within its system.
    pub name: String,

    /// Analysis-grade WCET `C` in ms.
    pub cost_ms: f64,

    /// Period `T` in ms.
    pub period_ms: f64,

    /// Relative deadline `D` in ms (conventionally `D ≤ T`).
    pub deadline_ms: f64,

    /// Fixed priority; a smaller value means a higher priority.
    pub priority: i32,
}

impl Task {
    /// Construct a task with an implicit deadline (`D = T`).
    pub fn new(name: impl Into<String>, cost_ms: f64, period_ms: f64, priority: i32) -> Self {
        Self {
            name: name.into(),
            cost_ms,
            period_ms,
            deadline_ms: period_ms,
            priority,
        }
    }

    /// Returns the task with a different relative deadline.
    pub fn with_deadline(self, deadline_ms: f64) -> Self {
        Self {
            deadline_ms,
            ..self
        }
    }

    /// CPU utilisation `C / T`.
    pub fn utilization(&self) -> f64 {
        self.cost_ms / self.period_ms
    }

    /// `true` when the deadline equals the period within [`DEADLINE_TOLERANCE`].
    pub fn has_implicit_deadline(&self) -> bool {
        (self.deadline_ms - self.period_ms).abs() < DEADLINE_TOLERANCE
    }

    /// `true` if `self` has strictly higher priority than `other`.
    pub fn preempts(&self, other: &Task) -> bool {
        self.priority < other.priority
    }

    /// Presentation order: priority first, ties broken by task name.
    pub fn priority_order(&self, other: &Task) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.name.cmp(&other.name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
