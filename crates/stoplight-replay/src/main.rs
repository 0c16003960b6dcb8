//! Scenario replay for the Stoplight Initiative tracker.
//!
//! Loads a scripted encounter from YAML, attaches a tracker to an
//! in-memory encounter, and replays every step, printing the zone
//! arrangement after each one.
//!
//! ```text
//! scenario.yaml --> InMemoryEncounter --> Tracker --> zones per step
//! ```
//!
//! Failed encounter writes are printed with the step that caused them; the
//! replay keeps going.

mod error;
mod render;
mod replay;
mod scenario;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use stoplight_core::{Encounter, TrackerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ReplayError;
use crate::render::{Format, write_report};
use crate::replay::Replay;
use crate::scenario::Scenario;

/// Replay a scripted encounter through the stoplight tracker.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Scenario file to replay.
    scenario: PathBuf,

    /// Tracker configuration. Defaults apply when the file is missing.
    #[arg(short, long, default_value = "stoplight-config.yaml")]
    config: PathBuf,

    /// Print one JSON object per step instead of text.
    #[arg(long)]
    json: bool,
}

/// Application entry point.
///
/// Loads configuration, initializes logging on stderr, then replays the
/// scenario and writes each step's zones to stdout.
///
/// # Errors
///
/// Returns an error if the configuration or scenario cannot be loaded, or
/// if a step refers to a participant the encounter does not have.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        scenario = %cli.scenario.display(),
        config = %cli.config.display(),
        "stoplight-replay starting"
    );

    let scenario = Scenario::from_file(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    let mut replay = Replay::new(config, &scenario)?;

    let format = if cli.json { Format::Json } else { Format::Text };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed_writes: usize = 0;
    replay
        .run(&scenario, |report| {
            failed_writes = failed_writes.saturating_add(report.failures.len());
            write_report(&mut out, report, format)
        })
        .await?;

    info!(
        steps = scenario.steps.len(),
        round = replay.encounter().current_round(),
        failed_writes,
        started = replay.tracker().is_started(),
        needs_resync = replay.tracker().needs_resync(),
        "Replay finished"
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<TrackerConfig, ReplayError> {
    if !path.exists() {
        return Ok(TrackerConfig::default());
    }
    Ok(TrackerConfig::from_file(path)?)
}
