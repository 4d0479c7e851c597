/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Declarative task-topology table.
//!
//! One table describes both systems; the task-set builder consumes any
//! [`SystemTopology`] without knowing whether it is the leader or the
//! follower.  The only per-system difference (optional vs required samples)
//! is carried by [`TaskTemplate::required`].
//!
//! ```yaml
//! systems:
//!   follower:
//!     tasks:
//!       - name: F_emergency
//!         components:
//!           - "F4 UDP msg->event"
//!           - { label: "F5 EVT_EMERGENCY", fallback: "F5 FSM per-event" }
//!         period_ms: 50.0
//!         deadline_ms: 50.0   # optional, defaults to period_ms
//!         priority: 1
//!         required: true      # optional, defaults to true
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::task::System;

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TopologyFile {
    systems: BTreeMap<System, SystemEntry>,
}

#[derive(Debug, Deserialize)]
struct SystemEntry {
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
struct TaskEntry {
    name: String,
    components: Vec<ComponentEntry>,
    period_ms: f64,
    deadline_ms: Option<f64>,
    priority: i32,
    #[serde(default = "default_required")]
    required: bool,
}

/// A component is either a bare label or a `{label, fallback}` map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ComponentEntry {
    Label(String),
    WithFallback {
        label: String,
        #[serde(default)]
        fallback: Option<String>,
    },
}

fn default_required() -> bool {
    true
}

// ── Public data structures ────────────────────────────────────────────────────

/// Reference to one measured component of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    /// Exact measurement label.
    pub label: String,

    /// Generic label tried when `label` was not measured.
    pub fallback: Option<String>,
}

impl ComponentRef {
    pub fn exact(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(label: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fallback: Some(fallback.into()),
        }
    }
}

impl From<ComponentEntry> for ComponentRef {
    fn from(entry: ComponentEntry) -> Self {
        match entry {
            ComponentEntry::Label(label) => ComponentRef::exact(label),
            ComponentEntry::WithFallback { label, fallback } => ComponentRef { label, fallback },
        }
    }
}

/// One row of the topology table.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    pub name: String,

    /// Components executed sequentially within one job of the task.
    pub components: Vec<ComponentRef>,

    pub period_ms: f64,
    pub deadline_ms: f64,
    pub priority: i32,

    /// `false` → the task is silently omitted when a component was not
    /// measured.  `true` → a missing component aborts the system's analysis.
    pub required: bool,
}

impl TaskTemplate {
    /// Required task with an implicit deadline.
    pub fn new(
        name: impl Into<String>,
        components: Vec<ComponentRef>,
        period_ms: f64,
        priority: i32,
    ) -> Self {
        Self {
            name: name.into(),
            components,
            period_ms,
            deadline_ms: period_ms,
            priority,
            required: true,
        }
    }

    pub fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    pub fn with_deadline(self, deadline_ms: f64) -> Self {
        Self {
            deadline_ms,
            ..self
        }
    }
}

/// Task table of a single system.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemTopology {
    pub system: System,
    pub tasks: Vec<TaskTemplate>,
}

// ── Topology ──────────────────────────────────────────────────────────────────

/// Task tables for every analysed system.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    systems: BTreeMap<System, SystemTopology>,
}

/// Leader period and deadline, `LEADER_TICK_DT`.
const LEADER_TICK_MS: f64 = 250.0;

/// Follower physics period, `FOLLOWER_PHYS_DT`.
const FOLLOWER_PHYS_MS: f64 = 250.0;

/// Follower watchdog period.
const FOLLOWER_WATCHDOG_MS: f64 = 100.0;

/// Emergency broadcast period.
const EMERGENCY_MS: f64 = 50.0;

/// Generic per-event FSM cost, used when an event type was never triggered.
const FSM_PER_EVENT: &str = "F5 FSM per-event";

impl Topology {
    /// The truck-platoon task model.
    ///
    /// Follower message tasks combine the receive/decode cost with the FSM
    /// handling of that message class into a single task.
    pub fn builtin() -> Self {
        let leader = SystemTopology {
            system: System::Leader,
            tasks: vec![
                TaskTemplate::new(
                    "L_tick",
                    vec![ComponentRef::exact("L1 tick-producer iter")],
                    LEADER_TICK_MS,
                    6,
                ),
                TaskTemplate::new(
                    "L_fsm",
                    vec![ComponentRef::exact("L2 FSM per-event")],
                    LEADER_TICK_MS,
                    3,
                ),
                TaskTemplate::new(
                    "L_send",
                    vec![ComponentRef::exact("L3 send one cmd")],
                    LEADER_TICK_MS,
                    4,
                ),
                // Incoming messages are rare in steady state and may be absent
                // from a measurement run.
                TaskTemplate::new(
                    "L_rx",
                    vec![ComponentRef::exact("L4 rx msg->event")],
                    LEADER_TICK_MS,
                    5,
                )
                .optional(),
            ],
        };

        let follower = SystemTopology {
            system: System::Follower,
            tasks: vec![
                TaskTemplate::new(
                    "F_emergency",
                    vec![
                        ComponentRef::exact("F4 UDP msg->event"),
                        ComponentRef::with_fallback("F5 EVT_EMERGENCY", FSM_PER_EVENT),
                    ],
                    EMERGENCY_MS,
                    1,
                ),
                TaskTemplate::new(
                    "F_watchdog",
                    vec![ComponentRef::exact("F2 watchdog iter")],
                    FOLLOWER_WATCHDOG_MS,
                    2,
                ),
                // Timeout handling is sporadic; modelled as periodic at the
                // watchdog rate.
                TaskTemplate::new(
                    "F_timeout_fsm",
                    vec![ComponentRef::with_fallback(
                        "F5 EVT_LEADER_TIMEOUT",
                        FSM_PER_EVENT,
                    )],
                    FOLLOWER_WATCHDOG_MS,
                    2,
                ),
                TaskTemplate::new(
                    "F_cruise",
                    vec![
                        ComponentRef::exact("F3 TCP msg->event"),
                        ComponentRef::with_fallback("F5 EVT_CRUISE_CMD", FSM_PER_EVENT),
                    ],
                    FOLLOWER_PHYS_MS,
                    5,
                ),
                TaskTemplate::new(
                    "F_distance",
                    vec![
                        ComponentRef::exact("F4 UDP msg->event"),
                        ComponentRef::with_fallback("F5 EVT_DISTANCE", FSM_PER_EVENT),
                    ],
                    FOLLOWER_PHYS_MS,
                    5,
                ),
                TaskTemplate::new(
                    "F_physics",
                    vec![ComponentRef::exact("F1 physics iter")],
                    FOLLOWER_PHYS_MS,
                    8,
                ),
            ],
        };

        Self::from_systems([leader, follower])
    }

    /// Build a topology from system tables; a later table for the same
    /// system replaces an earlier one.
    pub fn from_systems(systems: impl IntoIterator<Item = SystemTopology>) -> Self {
        Self {
            systems: systems.into_iter().map(|s| (s.system, s)).collect(),
        }
    }

    /// Parse a topology table from a YAML file.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not valid YAML, or the table is
    /// inconsistent (see [`from_yaml_str`](Self::from_yaml_str)).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading task topology from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open topology file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid topology file: {}", path.display()))
    }

    /// Parse a topology table from YAML text.
    ///
    /// # Errors
    /// Rejects a task with no components and duplicate task names within one
    /// system.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: TopologyFile =
            serde_yaml::from_str(content).context("Failed to parse topology YAML")?;

        let mut systems = Vec::with_capacity(file.systems.len());
        for (system, entry) in file.systems {
            let mut seen = HashSet::new();
            let mut tasks = Vec::with_capacity(entry.tasks.len());

            for task in entry.tasks {
                if task.components.is_empty() {
                    bail!("{system} task '{}' has no components", task.name);
                }
                if !seen.insert(task.name.clone()) {
                    bail!("{system} task '{}' is defined more than once", task.name);
                }

                let template = TaskTemplate {
                    deadline_ms: task.deadline_ms.unwrap_or(task.period_ms),
                    name: task.name,
                    components: task.components.into_iter().map(ComponentRef::from).collect(),
                    period_ms: task.period_ms,
                    priority: task.priority,
                    required: task.required,
                };
                debug!(
                    "  {}: {} | T={}ms | D={}ms | prio={} | required={} | components={}",
                    system,
                    template.name,
                    template.period_ms,
                    template.deadline_ms,
                    template.priority,
                    template.required,
                    template.components.len(),
                );
                tasks.push(template);
            }

            info!("Loaded {} task template(s) for {}", tasks.len(), system);
            systems.push(SystemTopology { system, tasks });
        }

        Ok(Self::from_systems(systems))
    }

    pub fn system(&self, system: System) -> Option<&SystemTopology> {
        self.systems.get(&system)
    }

    /// All system tables, leader first.
    pub fn systems(&self) -> impl Iterator<Item = &SystemTopology> {
        self.systems.values()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // ── builtin ───────────────────────────────────────────────────────────────

    #[test]
    fn builtin_has_both_systems_in_order() {
        let topo = Topology::builtin();
        let systems: Vec<_> = topo.systems().map(|s| s.system).collect();
        assert_eq!(systems, [System::Leader, System::Follower]);
    }

    #[test]
    fn builtin_leader_only_rx_is_optional() {
        let topo = Topology::builtin();
        let leader = topo.system(System::Leader).unwrap();
        assert_eq!(leader.tasks.len(), 4);
        for t in &leader.tasks {
            assert_eq!(t.required, t.name != "L_rx", "task {}", t.name);
            assert_eq!(t.period_ms, 250.0);
            assert_eq!(t.deadline_ms, 250.0);
        }
    }

    #[test]
    fn builtin_follower_is_all_required() {
        let topo = Topology::builtin();
        let follower = topo.system(System::Follower).unwrap();
        assert_eq!(follower.tasks.len(), 6);
        assert!(follower.tasks.iter().all(|t| t.required));
    }

    #[test]
    fn builtin_emergency_combines_udp_and_fsm() {
        let topo = Topology::builtin();
        let em = topo
            .system(System::Follower)
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.name == "F_emergency")
            .unwrap();
        assert_eq!(em.period_ms, 50.0);
        assert_eq!(em.priority, 1);
        assert_eq!(
            em.components,
            vec![
                ComponentRef::exact("F4 UDP msg->event"),
                ComponentRef::with_fallback("F5 EVT_EMERGENCY", "F5 FSM per-event"),
            ]
        );
    }

    // ── YAML ──────────────────────────────────────────────────────────────────

    #[test]
    fn parse_yaml_with_both_component_forms() {
        let yaml = r#"
systems:
  follower:
    tasks:
      - name: F_emergency
        components:
          - "F4 UDP msg->event"
          - { label: "F5 EVT_EMERGENCY", fallback: "F5 FSM per-event" }
        period_ms: 50.0
        priority: 1
      - name: F_log
        components: [{ label: "F9 log flush" }]
        period_ms: 1000.0
        deadline_ms: 500.0
        priority: 9
        required: false
"#;
        let topo = Topology::from_yaml_str(yaml).unwrap();
        assert!(topo.system(System::Leader).is_none());

        let follower = topo.system(System::Follower).unwrap();
        let em = &follower.tasks[0];
        assert_eq!(em.deadline_ms, 50.0, "deadline defaults to period");
        assert!(em.required, "required defaults to true");
        assert_eq!(em.components[1].fallback.as_deref(), Some("F5 FSM per-event"));

        let log = &follower.tasks[1];
        assert_eq!(log.deadline_ms, 500.0);
        assert!(!log.required);
        assert_eq!(log.components, vec![ComponentRef::exact("F9 log flush")]);
    }

    #[test]
    fn task_without_components_is_rejected() {
        let yaml = r#"
systems:
  leader:
    tasks:
      - { name: L_empty, components: [], period_ms: 10.0, priority: 1 }
"#;
        let err = Topology::from_yaml_str(yaml).unwrap_err();
        assert!(format!("{err:#}").contains("has no components"));
    }

    #[test]
    fn duplicate_task_name_is_rejected() {
        let yaml = r#"
systems:
  leader:
    tasks:
      - { name: L_a, components: [x], period_ms: 10.0, priority: 1 }
      - { name: L_a, components: [y], period_ms: 20.0, priority: 2 }
"#;
        let err = Topology::from_yaml_str(yaml).unwrap_err();
        assert!(format!("{err:#}").contains("more than once"));
    }

    #[test]
    fn same_name_in_different_systems_is_allowed() {
        let yaml = r#"
systems:
  leader:
    tasks:
      - { name: tick, components: [x], period_ms: 10.0, priority: 1 }
  follower:
    tasks:
      - { name: tick, components: [y], period_ms: 10.0, priority: 1 }
"#;
        assert!(Topology::from_yaml_str(yaml).is_ok());
    }

    #[test]
    fn unknown_system_is_rejected() {
        let yaml = "systems:\n  wingman:\n    tasks: []\n";
        assert!(Topology::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn load_from_file_reports_path() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"systems: [not, a, map]\n").unwrap();
        let err = Topology::load_from_file(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid topology file"));
    }

    #[test]
    fn missing_file_returns_error() {
        assert!(Topology::load_from_file(Path::new("/nonexistent/topology.yaml")).is_err());
    }
}
