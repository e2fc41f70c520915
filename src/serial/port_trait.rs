//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for serial port I/O operations
///
/// The engine loop only ever reads whatever is available, writes whole
/// frames, and flushes; blocking/timeout policy belongs to the
/// implementation behind this trait.
#[async_trait]
pub trait SerialPortIO: Send {
    /// Read available bytes into `buf`, returning how many arrived
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}
