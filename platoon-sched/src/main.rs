/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use platoon_sched::analysis::{AnalysisOptions, SchedulabilityAnalyzer, SystemReport};
use platoon_sched::config::{
    MarginPolicy, MeasurementStore, Topology, DEFAULT_MARGIN, DEFAULT_RARE_MARGIN,
    DEFAULT_RARE_THRESHOLD,
};
use platoon_sched::task::System;

// ── CLI argument definition ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SystemSelection {
    Leader,
    Follower,
    All,
}

impl SystemSelection {
    /// The single system requested, `None` for `All`.
    fn single(self) -> Option<System> {
        match self {
            SystemSelection::Leader => Some(System::Leader),
            SystemSelection::Follower => Some(System::Follower),
            SystemSelection::All => None,
        }
    }
}

/// Truck-platoon schedulability analysis.
///
/// Example:
///   platoon-sched --samples demos/samples.yaml --system all --report report.yaml
#[derive(Debug, Parser)]
#[command(
    name = "platoon-sched",
    about = "EDF and fixed-priority schedulability analysis from measured execution times",
    long_about = None,
)]
struct Cli {
    /// YAML file with the measured samples (label, count, max_us, avg_us).
    #[arg(short = 's', long = "samples")]
    samples: PathBuf,

    /// YAML task topology; the built-in platoon task model is used if omitted.
    #[arg(short = 't', long = "topology")]
    topology: Option<PathBuf>,

    /// Which system(s) to analyse.
    #[arg(long = "system", value_enum, default_value_t = SystemSelection::All)]
    system: SystemSelection,

    /// Margin applied to samples observed at least `--rare-threshold` times.
    #[arg(long = "default-margin", default_value_t = DEFAULT_MARGIN)]
    default_margin: f64,

    /// Margin applied to rarely observed samples.
    #[arg(long = "rare-margin", default_value_t = DEFAULT_RARE_MARGIN)]
    rare_margin: f64,

    /// Samples with fewer observations than this are considered rare.
    #[arg(long = "rare-threshold", default_value_t = DEFAULT_RARE_THRESHOLD)]
    rare_threshold: u64,

    /// Skip the fixed-priority response-time analysis.
    #[arg(long = "no-rta", default_value_t = false)]
    no_rta: bool,

    /// Write the per-system reports to this YAML file.
    #[arg(short = 'r', long = "report")]
    report: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        samples        = %cli.samples.display(),
        topology       = ?cli.topology,
        system         = ?cli.system,
        default_margin = cli.default_margin,
        rare_margin    = cli.rare_margin,
        rare_threshold = cli.rare_threshold,
        rta            = !cli.no_rta,
        "Configuration"
    );

    // ── Load inputs ───────────────────────────────────────────────────────────
    let mut store = MeasurementStore::new();
    if let Err(e) = store.load_from_file(&cli.samples) {
        error!("Failed to load measurements: {:#}", e);
        process::exit(1);
    }

    let topology = match &cli.topology {
        Some(path) => match Topology::load_from_file(path) {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to load task topology: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            info!("No topology file provided, using the built-in platoon task model");
            Topology::builtin()
        }
    };

    let policy = MarginPolicy {
        default_margin: cli.default_margin,
        rare_margin: cli.rare_margin,
        rare_threshold: cli.rare_threshold,
    };

    // ── Analyse ───────────────────────────────────────────────────────────────
    let analyzer = SchedulabilityAnalyzer::new(Arc::new(store), policy).with_options(
        AnalysisOptions {
            run_rta: !cli.no_rta,
        },
    );

    // `all` covers whatever the topology defines; a single system is analysed
    // even if absent, so the operator gets an error for it.
    let results = match cli.system.single() {
        Some(system) => vec![(system, analyzer.analyze_system(&topology, system))],
        None => analyzer.analyze_all(&topology),
    };

    let mut reports = Vec::new();
    let mut failed = false;
    for (system, result) in results {
        match result {
            Ok(report) => {
                if report.all_schedulable == Some(false) {
                    warn!(system = %system, "at least one task may miss its deadline");
                }
                reports.push(report);
            }
            Err(e) => {
                error!(system = %system, "Analysis aborted: {}", e);
                failed = true;
            }
        }
    }

    if let Some(path) = &cli.report {
        if let Err(e) = write_report(path, &reports) {
            error!("Failed to write report: {:#}", e);
            process::exit(1);
        }
        info!("Report written to {}", path.display());
    }

    if failed {
        process::exit(1);
    }
}

fn write_report(path: &Path, reports: &[SystemReport]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    serde_yaml::to_writer(file, reports)
        .with_context(|| format!("Failed to serialise report to: {}", path.display()))?;
    Ok(())
}
