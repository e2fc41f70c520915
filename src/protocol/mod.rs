//! # Base Protocol Module
//!
//! Implementation of the binary framing protocol spoken by the base
//! controller over the serial link.
//!
//! This module handles:
//! - Frame synchronization and validation (resumable byte-stream framer)
//! - Sensor sub-packet decoding (core telemetry, IR, inertia, cliff, ...)
//! - Outbound command encoding (velocity and tagged commands)
//! - XOR checksum calculation

pub mod checksum;
pub mod command;
pub mod dispatcher;
pub mod encoder;
pub mod framer;
pub mod sensors;

/// Frame start sequence, first byte
pub const STX_0: u8 = 0xAA;

/// Frame start sequence, second byte
pub const STX_1: u8 = 0x55;

/// Frame start sequence (2 bytes, always `AA 55`)
pub const START_SEQUENCE: [u8; 2] = [STX_0, STX_1];

/// Checksum trailer length in bytes
pub const CHECKSUM_LEN: usize = 1;

/// Minimum declared payload length accepted by the framer
pub const MIN_PAYLOAD_LEN: usize = 1;

/// Maximum declared payload length accepted by the framer
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Byte identifying the fixed-format velocity command frame
pub const COMMAND_BASE_CONTROL: u8 = 0x01;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(START_SEQUENCE, [0xAA, 0x55]);
        assert_eq!(CHECKSUM_LEN, 1);
        assert_eq!(MIN_PAYLOAD_LEN, 1);
        assert_eq!(MAX_PAYLOAD_LEN, 64);
    }
}
