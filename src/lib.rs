//! # Base Bridge Library
//!
//! Host-side serial driver for a differential-drive mobile robot base.
//!
//! This library provides the core functionality for talking to a base
//! controller over its binary framing protocol: frame synchronization,
//! sensor sub-packet decoding, wraparound-correct wheel odometry, and
//! outbound motion command encoding.

pub mod config;
pub mod driver;
pub mod error;
pub mod odometry;
pub mod protocol;
pub mod serial;
pub mod telemetry;
