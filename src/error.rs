//! # Error Types
//!
//! Custom error types for Base Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Base Bridge
#[derive(Debug, Error)]
pub enum BaseBridgeError {
    /// Wire protocol errors (framing, encoding)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Command serialization failures
    #[error("command serialize error: {0}")]
    CommandSerialize(String),

    /// Serial port errors
    #[error("serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Base Bridge
pub type Result<T> = std::result::Result<T, BaseBridgeError>;
