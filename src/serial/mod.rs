//! # Serial Communication Module
//!
//! Handles the serial link to the base controller.
//!
//! This module handles:
//! - Opening the serial port (8 data bits, no parity, 1 stop bit)
//! - Async read/write operations behind the [`SerialPortIO`] trait
//! - Device auto-detection across common adapter paths

pub mod port_trait;

use async_trait::async_trait;
use std::io;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{BaseBridgeError, Result};
pub use port_trait::SerialPortIO;

/// Default baud rate of the base controller link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common)
    "/dev/ttyACM0", // USB CDC devices
];

/// Serial port handle for the base controller
pub struct BaseSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for BaseSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl BaseSerial {
    /// Open the base controller link, auto-detecting the device path
    pub fn open(baud_rate: u32) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open a specific device path
    pub fn open_path(path: &str, baud_rate: u32) -> Result<Self> {
        let port = Self::open_port(path, baud_rate)?;
        info!("opened base controller at {}", path);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Open the first path in `paths` that accepts the connection
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("trying serial port: {}", path);
            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("opened base controller at {}", path);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(BaseBridgeError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BaseBridgeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Discard anything queued in the driver-side buffers
    pub fn clear(&mut self) -> Result<()> {
        use tokio_serial::SerialPort;
        self.port
            .clear(tokio_serial::ClearBuffer::All)
            .map_err(|e| BaseBridgeError::Serial(format!("Failed to clear buffers: {}", e)))
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl SerialPortIO for BaseSerial {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.port.read(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_BAUD_RATE, 115_200);
        assert_eq!(DEFAULT_DEVICE_PATHS.len(), 2);
        assert_eq!(DEFAULT_DEVICE_PATHS[0], "/dev/ttyUSB0");
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = BaseSerial::open_with_paths(invalid_paths, DEFAULT_BAUD_RATE);

        assert!(result.is_err());
        match result.unwrap_err() {
            BaseBridgeError::SerialPortNotFound(msg) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        let result = BaseSerial::open_with_paths(empty_paths, DEFAULT_BAUD_RATE);
        assert!(matches!(
            result.unwrap_err(),
            BaseBridgeError::SerialPortNotFound(_)
        ));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = BaseSerial::open_path("/dev/nonexistent_serial_device_12345", 115_200);

        assert!(result.is_err());
        match result.unwrap_err() {
            BaseBridgeError::Serial(msg) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
            }
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[test]
    fn test_mock_port_scripted_reads() {
        use port_trait::mocks::MockSerialPort;

        let mut port = MockSerialPort::new();
        port.push_read(&[0xAA, 0x55]);
        port.push_read(&[0x01]);

        tokio_test::block_on(async {
            let mut buf = [0u8; 64];
            let n = port.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], &[0xAA, 0x55]);

            let n = port.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], &[0x01]);

            // Script drained: behaves like a timed-out read
            let n = port.read(&mut buf).await.unwrap();
            assert_eq!(n, 0);
        });
    }

    #[test]
    fn test_mock_port_records_writes() {
        use port_trait::mocks::MockSerialPort;

        let mut port = MockSerialPort::new();
        tokio_test::block_on(async {
            port.write_all(&[1, 2, 3]).await.unwrap();
            port.write_all(&[4]).await.unwrap();
        });

        assert_eq!(port.get_written_data(), vec![vec![1, 2, 3], vec![4]]);
    }
}
