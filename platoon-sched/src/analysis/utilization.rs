/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Utilisation-based schedulability tests.
//!
//! # EDF
//! For independent periodic tasks on one core under preemptive EDF:
//!
//! $$U = \sum_{i=1}^{n} \frac{C_i}{T_i} \leq 1$$
//!
//! is **necessary and sufficient** when every deadline is implicit
//! (`D_i = T_i`).  With constrained deadlines (`D_i ≤ T_i`) it is only
//! necessary; a proof would need the demand-bound function, which is not
//! computed here.  A constrained-deadline set with `U ≤ 1` is therefore
//! reported as [`EdfVerdict::NecessaryOnly`], never as a pass.
//!
//! # Rate monotonic
//! The Liu & Layland bound `n (2^{1/n} − 1)` is reported alongside as a quick
//! sufficient test for fixed priorities.  The authoritative fixed-priority
//! verdict is the response-time analysis in [`rta`](super::rta).

use std::fmt;

use serde::Serialize;

use crate::task::Task;

/// Total utilisation `Σ C_i / T_i`.
///
/// No upper bound is enforced; an overloaded set simply yields `U > 1`.
pub fn utilization(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::utilization).sum()
}

/// `true` if every task has `D = T` (vacuously true for an empty set).
pub fn all_implicit_deadlines(tasks: &[Task]) -> bool {
    tasks.iter().all(Task::has_implicit_deadline)
}

// ── EDF ───────────────────────────────────────────────────────────────────────

/// Deadline model of a task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineModel {
    /// Every `D_i = T_i`.
    Implicit,
    /// At least one `D_i ≠ T_i`.
    Constrained,
}

/// Outcome of the EDF utilisation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdfVerdict {
    /// Implicit deadlines and `U ≤ 1`: schedulable under EDF.
    Pass,
    /// `U > 1`: not schedulable under any policy.
    Fail,
    /// Constrained deadlines and `U ≤ 1`: the necessary condition holds but
    /// schedulability is not proven.
    NecessaryOnly,
}

impl fmt::Display for EdfVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdfVerdict::Pass => f.write_str("PASS"),
            EdfVerdict::Fail => f.write_str("FAIL"),
            EdfVerdict::NecessaryOnly => f.write_str("necessary-only, inconclusive"),
        }
    }
}

/// Result of [`edf_test`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdfTest {
    pub deadline_model: DeadlineModel,
    pub utilization: f64,
    pub verdict: EdfVerdict,
}

/// EDF utilisation test appropriate to the task set's deadline model.
pub fn edf_test(tasks: &[Task]) -> EdfTest {
    let u = utilization(tasks);
    let deadline_model = if all_implicit_deadlines(tasks) {
        DeadlineModel::Implicit
    } else {
        DeadlineModel::Constrained
    };

    let verdict = match (deadline_model, u <= 1.0) {
        (_, false) => EdfVerdict::Fail,
        (DeadlineModel::Implicit, true) => EdfVerdict::Pass,
        (DeadlineModel::Constrained, true) => EdfVerdict::NecessaryOnly,
    };

    EdfTest {
        deadline_model,
        utilization: u,
        verdict,
    }
}

// ── Liu & Layland ─────────────────────────────────────────────────────────────

/// Liu & Layland rate-monotonic utilisation bound for `n` tasks.
///
/// `U_bound(n) = n × (2^(1/n) − 1)`; `1.0` for one task, `0.0` for none.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn leader_tasks() -> Vec<Task> {
        vec![
            Task::new("L_fsm", 2.634, 250.0, 3),
            Task::new("L_send", 2.163, 250.0, 4),
            Task::new("L_rx", 0.400, 250.0, 5),
            Task::new("L_tick", 0.852, 250.0, 6),
        ]
    }

    // ── utilization ───────────────────────────────────────────────────────────

    #[test]
    fn empty_set_has_zero_utilization() {
        assert_eq!(utilization(&[]), 0.0);
    }

    #[test]
    fn utilization_is_sum_of_cost_over_period() {
        let tasks = vec![
            Task::new("a", 3.0, 10.0, 1),
            Task::new("b", 5.0, 20.0, 2),
            Task::new("c", 8.0, 50.0, 3),
        ];
        assert!((utilization(&tasks) - (0.3 + 0.25 + 0.16)).abs() < 1e-12);
    }

    #[test]
    fn leader_scenario_utilization() {
        // (2.634 + 2.163 + 0.400 + 0.852) / 250
        let u = utilization(&leader_tasks());
        assert!((u - 0.024196).abs() < 1e-9, "U = {u}");
    }

    #[test]
    fn reordering_does_not_change_utilization() {
        let tasks = leader_tasks();
        let mut reversed = tasks.clone();
        reversed.reverse();
        let mut rotated = tasks.clone();
        rotated.rotate_left(2);

        let u = utilization(&tasks);
        assert!((utilization(&reversed) - u).abs() < 1e-12);
        assert!((utilization(&rotated) - u).abs() < 1e-12);
    }

    #[test]
    fn overload_is_a_value_not_an_error() {
        let tasks = vec![Task::new("a", 30.0, 10.0, 1)];
        assert_eq!(utilization(&tasks), 3.0);
    }

    // ── edf_test ──────────────────────────────────────────────────────────────

    #[test]
    fn leader_scenario_passes_edf() {
        let r = edf_test(&leader_tasks());
        assert_eq!(r.deadline_model, DeadlineModel::Implicit);
        assert_eq!(r.verdict, EdfVerdict::Pass);
    }

    #[test]
    fn implicit_deadlines_with_exactly_full_utilization_pass() {
        let tasks = vec![Task::new("a", 125.0, 250.0, 1), Task::new("b", 25.0, 50.0, 2)];
        let r = edf_test(&tasks);
        assert_eq!(r.utilization, 1.0);
        assert_eq!(r.verdict, EdfVerdict::Pass);
    }

    #[test]
    fn implicit_deadlines_just_over_full_utilization_fail() {
        let tasks = vec![
            Task::new("a", 125.0, 250.0, 1),
            Task::new("b", 25.0 + 1e-9, 50.0, 2),
        ];
        let r = edf_test(&tasks);
        assert!(r.utilization > 1.0);
        assert_eq!(r.verdict, EdfVerdict::Fail);
    }

    #[test]
    fn constrained_deadlines_are_only_necessary() {
        let tasks = vec![
            Task::new("a", 1.0, 100.0, 1).with_deadline(40.0),
            Task::new("b", 1.0, 100.0, 2),
        ];
        let r = edf_test(&tasks);
        assert_eq!(r.deadline_model, DeadlineModel::Constrained);
        assert_eq!(r.verdict, EdfVerdict::NecessaryOnly);
        assert_ne!(r.verdict, EdfVerdict::Pass);
    }

    #[test]
    fn constrained_deadlines_over_full_utilization_fail() {
        let tasks = vec![Task::new("a", 60.0, 50.0, 1).with_deadline(40.0)];
        assert_eq!(edf_test(&tasks).verdict, EdfVerdict::Fail);
    }

    #[test]
    fn empty_set_is_implicit_and_passes() {
        let r = edf_test(&[]);
        assert_eq!(r.deadline_model, DeadlineModel::Implicit);
        assert_eq!(r.verdict, EdfVerdict::Pass);
    }

    #[test]
    fn verdict_display_is_qualified() {
        assert_eq!(EdfVerdict::Pass.to_string(), "PASS");
        assert_eq!(EdfVerdict::Fail.to_string(), "FAIL");
        assert!(EdfVerdict::NecessaryOnly.to_string().contains("inconclusive"));
    }

    // ── liu_layland_bound ─────────────────────────────────────────────────────

    #[test]
    fn bound_zero_tasks_is_zero() {
        assert_eq!(liu_layland_bound(0), 0.0);
    }

    #[test]
    fn bound_one_task_is_one() {
        assert!((liu_layland_bound(1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn bound_two_tasks_is_approximately_0_828() {
        assert!((liu_layland_bound(2) - 0.8284).abs() < 1e-3);
    }

    #[test]
    fn bound_converges_toward_ln2() {
        assert!((liu_layland_bound(1000) - 2.0_f64.ln()).abs() < 1e-3);
    }
}
