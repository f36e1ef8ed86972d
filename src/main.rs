//! gps-probe - periodic GPS probe for radio front-end devices
//!
//! Polls a GPS sensor on a fixed interval, decodes its NMEA RMC or GGA
//! sentence and prints accepted fixes as JSON lines on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Replay recorded sentences once per second
//! ./gps-probe --replay fixes.nmea
//!
//! # Publish void fixes too, every 250 ms
//! ./gps-probe --replay fixes.nmea --interval-ms 250 --allow-invalid
//!
//! # Same, explicit subcommand
//! ./gps-probe run --replay fixes.nmea
//!
//! # Replay a GGA capture
//! ./gps-probe --replay fixes.nmea --sensor gps_gpgga
//!
//! # Decode a single sentence
//! ./gps-probe decode '$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A'
//! ```
//!
//! # Environment Variables
//!
//! - `GPS_PROBE_CONFIG`: Path to a TOML config file (default: ./gps_probe.toml)
//! - `GPS_PROBE_INTERVAL_MS`: Probe interval override
//! - `GPS_PROBE_REPLAY`: Replay file, same as `--replay`
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gps_probe::{JsonLinesPublisher, ProbeConfig, ProbeScheduler, ReplaySensor, SensorAccess};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "gps-probe")]
#[command(about = "Periodic GPS probe: NMEA RMC/GGA decoding and fix-gated position publishing")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides GPS_PROBE_CONFIG / ./gps_probe.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// File of recorded sentences to replay as the GPS sensor, one per line
    #[arg(long, value_name = "FILE", env = "GPS_PROBE_REPLAY", global = true)]
    replay: Option<PathBuf>,

    /// Override the probe interval (milliseconds)
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Publish fixes even when the device reports them void
    #[arg(long, global = true)]
    allow_invalid: bool,

    /// Override the sensor identifier to probe
    #[arg(long, global = true)]
    sensor: Option<String>,

    /// Emit logs as JSON objects instead of human-readable lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Probe the GPS sensor until Ctrl+C (default)
    Run,

    /// Decode one RMC or GGA sentence and print it as JSON
    Decode {
        /// The raw sentence, e.g. '$GPRMC,...'
        sentence: String,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// File/env config with CLI flags applied on top.
fn resolve_config(args: &CliArgs) -> Result<ProbeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = ProbeConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env_overrides();
            config
        }
        None => ProbeConfig::load(),
    };

    if let Some(ms) = args.interval_ms {
        config.interval_ms = ms;
    }
    if args.allow_invalid {
        config.require_valid = false;
    }
    if let Some(sensor) = &args.sensor {
        config.sensor_id.clone_from(sensor);
    }

    config.validate().context("Invalid probe configuration")?;
    Ok(config)
}

// ============================================================================
// Commands
// ============================================================================

fn run_decode(sentence: &str) -> Result<()> {
    let reading = gps_probe::decode_reading(sentence).context("Failed to decode sentence")?;
    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}

async fn run_probe(
    config: ProbeConfig,
    replay: PathBuf,
    cancel_token: CancellationToken,
) -> Result<()> {
    let sensor = ReplaySensor::from_file(&config.sensor_id, &replay)
        .with_context(|| format!("Failed to open replay file {}", replay.display()))?;
    info!(
        "📥 Input: replay ({} sentences from {})",
        sensor.len(),
        replay.display()
    );
    let sensor_names = sensor.names();

    let publisher = JsonLinesPublisher::new(std::io::stdout());
    let scheduler = ProbeScheduler::new(config, sensor, publisher)?;

    scheduler.start();
    if !scheduler.is_armed() {
        warn!(
            sensor = %scheduler.config().sensor_id,
            available = ?sensor_names,
            "GPS sensor unavailable, nothing to probe"
        );
        return Ok(());
    }

    cancel_token.cancelled().await;
    scheduler.stop();

    let stats = scheduler.stats();
    info!(
        fires = stats.fires,
        published = stats.published,
        rejected = stats.rejected,
        failed = stats.failed,
        skipped = stats.skipped,
        "GPS probe summary"
    );
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Logs go to stderr; stdout carries the published messages
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Some(SubCommand::Decode { sentence }) = &args.command {
        return run_decode(sentence);
    }

    let config = resolve_config(&args)?;
    let replay = args
        .replay
        .clone()
        .context("No GPS sensor source: pass --replay <FILE> or set GPS_PROBE_REPLAY")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  gps-probe");
    info!(
        "  Sensor: {} | Interval: {} ms | Require valid: {}",
        config.sensor_id, config.interval_ms, config.require_valid
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, stopping probe...");
        shutdown_token.cancel();
    });

    run_probe(config, replay, cancel_token).await?;

    info!("✓ gps-probe shutdown complete");
    Ok(())
}
