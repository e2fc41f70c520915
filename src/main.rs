//! # Base Bridge
//!
//! Host-side serial driver for a differential-drive mobile robot base.
//!
//! Opens the serial link, runs the driver engine loop, and reports
//! decoded activity until interrupted.

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

mod config;
mod driver;
mod error;
mod odometry;
mod protocol;
mod serial;
mod telemetry;

use config::Config;
use driver::{events::DriverEvent, Driver};
use serial::BaseSerial;

/// Fallback configuration path when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Seconds between status log lines
const STATUS_INTERVAL_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Base Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        info!("loading configuration from {}", config_path);
        Config::load(&config_path)?
    } else {
        warn!("{} not found, using built-in defaults", config_path);
        Config::default()
    };

    // Open the base controller link and discard any stale bytes
    let mut port = BaseSerial::open_path(&config.serial.port, config.serial.baud_rate)
        .or_else(|e| {
            warn!("configured port failed ({}), trying auto-detection", e);
            BaseSerial::open(config.serial.baud_rate)
        })?;
    port.clear()?;
    info!("base controller link up at {}", port.device_path());

    let (engine, handle) = Driver::new(&config, Box::new(port))?;
    let mut events = handle.subscribe();
    let worker = tokio::spawn(engine.run());

    let mut status_interval = interval(Duration::from_secs(STATUS_INTERVAL_SECS));
    let mut frame_count: u64 = 0;

    info!("driver running; press Ctrl+C to exit");
    loop {
        tokio::select! {
            event = events.recv() => {
                if let Ok(DriverEvent::Odometry) = event {
                    frame_count += 1;
                }
            }

            _ = status_interval.tick() => {
                let odom = handle.odometry();
                info!(
                    "frames: {}, wheels: L {:.3} rad @ {:.3} rad/s, R {:.3} rad @ {:.3} rad/s",
                    frame_count,
                    odom.left.position, odom.left.velocity,
                    odom.right.position, odom.right.velocity,
                );
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    // Stop motion first, then end the loop; the worker sends one final
    // zero-velocity command on its way out
    handle.stop();
    handle.shutdown();
    worker.await?;
    info!("driver terminated after {} frames", frame_count);

    Ok(())
}
