/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the schedulability analysis.
//!
//! Only conditions that make a verdict impossible are errors.  An overloaded
//! system, a diverging response-time iteration or an inconclusive EDF test
//! are *results* and are reported inside
//! [`SystemReport`](super::SystemReport) instead.
//!
//! | Variant | Scope |
//! |---|---|
//! | `MissingMeasurement` | aborts the affected system only |
//! | `SystemNotInTopology` | aborts the requested system only |

use thiserror::Error;

use crate::task::System;

/// Failure that aborts the analysis of one system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A required task component was not measured and no usable fallback
    /// sample exists.  A cost cannot be fabricated, so the system cannot be
    /// analysed.
    ///
    /// `available` lists every measured label (sorted) so the operator can fix
    /// the mismatch between the measurement run and the task topology.
    #[error(
        "{system} task '{task}': missing measurement '{label}'{} — available: [{}]",
        fallback_note(.fallback),
        .available.join(", ")
    )]
    MissingMeasurement {
        system: System,
        task: String,
        label: String,
        fallback: Option<String>,
        available: Vec<String>,
    },

    /// The topology has no task table for the requested system.
    #[error("no task topology defined for {system}")]
    SystemNotInTopology { system: System },
}

fn fallback_note(fallback: &Option<String>) -> String {
    match fallback {
        Some(fb) => format!(" (fallback '{fb}' also missing)"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_measurement_message_names_fallback() {
        let err = AnalysisError::MissingMeasurement {
            system: System::Follower,
            task: "F_timeout_fsm".into(),
            label: "F5 EVT_LEADER_TIMEOUT".into(),
            fallback: Some("F5 FSM per-event".into()),
            available: vec!["F1 physics iter".into(), "F2 watchdog iter".into()],
        };
        assert_eq!(
            err.to_string(),
            "follower task 'F_timeout_fsm': missing measurement 'F5 EVT_LEADER_TIMEOUT' \
             (fallback 'F5 FSM per-event' also missing) — available: [F1 physics iter, F2 watchdog iter]"
        );
    }

    #[test]
    fn missing_measurement_message_without_fallback() {
        let err = AnalysisError::MissingMeasurement {
            system: System::Leader,
            task: "L_tick".into(),
            label: "L1 tick-producer iter".into(),
            fallback: None,
            available: vec![],
        };
        assert_eq!(
            err.to_string(),
            "leader task 'L_tick': missing measurement 'L1 tick-producer iter' — available: []"
        );
    }
}
