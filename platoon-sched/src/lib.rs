/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedulability analysis for the truck-platoon leader and follower
//!
//! Turns measured execution-time samples into a periodic task model and
//! checks it with the EDF utilisation test and fixed-priority response-time
//! analysis.
//!
//! ```text
//! lib.rs
//! ├── task.rs         – System, ObservedSample, Task
//! ├── config/         – margin policy, YAML measurement store, task topology
//! ├── cost/           – margin selection and component cost combination
//! ├── taskset/        – topology + measurements → costed task set
//! └── analysis/       – utilisation/EDF, RTA, SchedulabilityAnalyzer
//! ```

pub mod analysis;
pub mod config;
pub mod cost;
pub mod task;
pub mod taskset;
