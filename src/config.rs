//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub base: BaseConfig,
    pub telemetry: TelemetryConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound on one blocking read, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Mobile base geometry
#[derive(Debug, Deserialize, Clone)]
pub struct BaseConfig {
    /// Wheel-to-wheel distance in meters
    #[serde(default = "default_wheelbase")]
    pub wheelbase: f64,

    /// Wheel radius in meters
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f64,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 4000 }

fn default_wheelbase() -> f64 { 0.298 }
fn default_wheel_radius() -> f64 { 0.042 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig {
                port: default_serial_port(),
                baud_rate: default_baud_rate(),
                timeout_ms: default_timeout_ms(),
            },
            base: BaseConfig {
                wheelbase: default_wheelbase(),
                wheel_radius: default_wheel_radius(),
            },
            telemetry: TelemetryConfig {
                enabled: default_telemetry_enabled(),
                log_dir: default_log_dir(),
                max_records_per_file: default_max_records_per_file(),
                max_files_to_keep: default_max_files_to_keep(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails. A configuration that fails validation must never
    /// reach the driver.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("serial port cannot be empty"),
            ));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom(
                    "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200",
                ),
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("timeout_ms must be between 1 and 10000"),
            ));
        }

        if self.base.wheelbase <= 0.0 || self.base.wheelbase > 1.0 {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("wheelbase must be between 0.0 and 1.0 meters"),
            ));
        }

        if self.base.wheel_radius <= 0.0 || self.base.wheel_radius > 0.5 {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("wheel_radius must be between 0.0 and 0.5 meters"),
            ));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("telemetry log_dir cannot be empty when enabled"),
            ));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("max_records_per_file must be greater than 0"),
            ));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(crate::error::BaseBridgeError::Config(
                toml::de::Error::custom("max_files_to_keep must be greater than 0"),
            ));
        }

        Ok(())
    }
}
