//! `vigil-replay`: run a recorded pose session through the fall detector.
//!
//! # Usage
//!
//! ```bash
//! vigil-replay session.jsonl
//! vigil-replay session.jsonl --config detector.toml --log-level debug
//! ```
//!
//! The recording holds one JSON [`PoseFrame`](vigil_core::PoseFrame) per
//! line. Every detector event is written to stdout as one JSON object per
//! line; logs go to stderr.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil_fall::{AlertContext, DetectorConfig, FallDetector, ReplaySource};

#[derive(Parser, Debug)]
#[command(name = "vigil-replay", version, about = "Replay a pose recording through the fall detector")]
struct Args {
    /// JSON-lines pose recording
    #[arg(value_name = "RECORDING")]
    recording: PathBuf,

    /// Detector configuration file (TOML, YAML or JSON).
    ///
    /// Without it, defaults apply with `VIGIL_*` environment overrides.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Location label attached to raised alerts
    #[arg(long)]
    location: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match args.config.as_deref() {
        Some(path) => {
            let path = path.to_str().context("config path is not valid UTF-8")?;
            info!("Loading detector configuration from {}", path);
            DetectorConfig::from_file(path)?
        }
        None => DetectorConfig::from_env()?,
    };

    let source = ReplaySource::from_file(&args.recording)
        .await
        .with_context(|| format!("failed to load recording {}", args.recording.display()))?;
    info!(frames = source.remaining(), "recording loaded");

    let mut detector = FallDetector::new(config, source);
    detector.set_alert_context(AlertContext {
        location: args.location,
        ..Default::default()
    });
    detector.on(|event| match serde_json::to_string(event) {
        Ok(line) => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{}", line);
        }
        Err(e) => tracing::error!("failed to encode {} event: {}", event.kind(), e),
    });

    detector.initialize().await?;
    let outcome = detector.run().await;
    let stats = detector.stats();
    detector.destroy().await?;
    outcome?;

    info!(
        processed = stats.frames_processed,
        skipped = stats.frames_skipped,
        episodes = stats.episodes,
        alerts = stats.alerts,
        false_alarms = stats.false_alarms,
        "replay finished"
    );
    Ok(())
}
