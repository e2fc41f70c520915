//! # Telemetry Module
//!
//! Logs decoded core sensor records and odometry snapshots to JSONL
//! files with rotation.
//!
//! This module handles:
//! - Formatting one record per decoded core frame as JSON Lines
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::odometry::OdometrySnapshot;
use crate::protocol::sensors::CoreSensors;

/// One telemetry line
#[derive(Debug, Serialize)]
struct TelemetryRecord<'a> {
    /// Host-side wall clock, RFC 3339
    timestamp: String,
    core: &'a CoreSensors,
    odometry: &'a OdometrySnapshot,
}

/// JSONL telemetry writer with file rotation
pub struct TelemetryLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    file: Option<File>,
    records_in_file: usize,
    file_seq: u64,
}

impl TelemetryLogger {
    /// Create the logger and its log directory
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&log_dir)?;
        Ok(Self {
            log_dir,
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            file: None,
            records_in_file: 0,
            file_seq: 0,
        })
    }

    /// Append one record, rotating files as configured
    pub fn log(&mut self, core: &CoreSensors, odometry: &OdometrySnapshot) -> Result<()> {
        if self.file.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = TelemetryRecord {
            timestamp: Utc::now().to_rfc3339(),
            core,
            odometry,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", line)?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Open a fresh log file and prune old ones
    fn rotate(&mut self) -> Result<()> {
        self.file_seq += 1;
        let name = format!(
            "telemetry-{}-{:04}.jsonl",
            Utc::now().format("%Y%m%d-%H%M%S"),
            self.file_seq
        );
        let path = self.log_dir.join(name);
        debug!("telemetry: rotating to {}", path.display());

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.file = Some(file);
        self.records_in_file = 0;
        self.prune()?;
        Ok(())
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().map(|ext| ext == "jsonl").unwrap_or(false)
            })
            .collect();
        logs.sort();

        if logs.len() > self.max_files_to_keep {
            let excess = logs.len() - self.max_files_to_keep;
            for path in &logs[..excess] {
                debug!("telemetry: pruning {}", path.display());
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_logger(dir: &TempDir, max_records: usize, max_files: usize) -> TelemetryLogger {
        let config = TelemetryConfig {
            enabled: true,
            log_dir: dir.path().to_string_lossy().into_owned(),
            max_records_per_file: max_records,
            max_files_to_keep: max_files,
        };
        TelemetryLogger::new(&config).unwrap()
    }

    fn jsonl_files(dir: &TempDir) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let mut logger = test_logger(&dir, 100, 5);

        let core = CoreSensors { time_stamp: 42, ..CoreSensors::default() };
        let odom = OdometrySnapshot::default();
        logger.log(&core, &odom).unwrap();
        logger.log(&core, &odom).unwrap();

        let files = jsonl_files(&dir);
        assert_eq!(files.len(), 1);
        let contents = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        // Each line is standalone JSON carrying the decoded values
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["core"]["time_stamp"], 42);
        assert!(parsed["timestamp"].is_string());
    }

    #[test]
    fn test_rotation_at_record_limit() {
        let dir = TempDir::new().unwrap();
        let mut logger = test_logger(&dir, 3, 5);

        let core = CoreSensors::default();
        let odom = OdometrySnapshot::default();
        for _ in 0..7 {
            logger.log(&core, &odom).unwrap();
        }

        // 7 records at 3 per file: two full files plus one started
        assert_eq!(jsonl_files(&dir).len(), 3);
    }

    #[test]
    fn test_prunes_oldest_files() {
        let dir = TempDir::new().unwrap();
        let mut logger = test_logger(&dir, 1, 2);

        let core = CoreSensors::default();
        let odom = OdometrySnapshot::default();
        for _ in 0..5 {
            logger.log(&core, &odom).unwrap();
        }

        assert!(jsonl_files(&dir).len() <= 2 + 1);
    }
}
