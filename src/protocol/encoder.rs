//! # Command Frame Encoder
//!
//! Builds outbound frames with the same checksum discipline as the inbound
//! direction: the trailer byte is the XOR of the length byte and the
//! payload, so a received copy folds to zero.
//!
//! Two encodings exist. The velocity command is a fixed 9-byte frame sent
//! every engine iteration; the generic encoding wraps any tagged command,
//! back-patching the length once the serializer has run.

use super::checksum::xor_checksum;
use super::command::SerializeCommand;
use super::{COMMAND_BASE_CONTROL, MAX_PAYLOAD_LEN, STX_0, STX_1};
use crate::error::{BaseBridgeError, Result};

/// Wire size of the fixed velocity command frame
pub const VELOCITY_FRAME_LEN: usize = 9;

/// Encode the fixed-format velocity command frame
///
/// Layout: start sequence (2) + length=5 (1) + command id (1) +
/// speed i16 LE (2) + radius i16 LE (2) + checksum (1).
pub fn encode_velocity_command(speed: i16, radius: i16) -> [u8; VELOCITY_FRAME_LEN] {
    let mut frame = [0u8; VELOCITY_FRAME_LEN];
    frame[0] = STX_0;
    frame[1] = STX_1;
    frame[2] = 0x05;
    frame[3] = COMMAND_BASE_CONTROL;
    frame[4..6].copy_from_slice(&speed.to_le_bytes());
    frame[6..8].copy_from_slice(&radius.to_le_bytes());
    frame[8] = xor_checksum(&frame[2..8]);
    frame
}

/// Encode a tagged command as a complete frame
///
/// The length byte is written as a placeholder, back-patched to the
/// serialized payload size, and the checksum appended last. Serializer
/// failures are returned to the caller; nothing is sent in that case.
pub fn encode_command(command: &impl SerializeCommand) -> Result<Vec<u8>> {
    let mut frame = vec![STX_0, STX_1, 0x00];
    command.serialize(&mut frame)?;

    let payload_len = frame.len() - 3;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(BaseBridgeError::Protocol(format!(
            "command payload {} bytes exceeds frame maximum {}",
            payload_len, MAX_PAYLOAD_LEN
        )));
    }
    frame[2] = payload_len as u8;
    let cs = xor_checksum(&frame[2..]);
    frame.push(cs);
    Ok(frame)
}

/// Derive the wire `(speed, radius)` pair from a requested body twist
///
/// * `radius = 0` for straight motion (`angular == 0`)
/// * `radius = ±1` mm for pure rotation (`linear == 0`)
/// * otherwise `radius = linear · 1000 / angular`, rounded, in mm
///
/// `speed` is the faster wheel's linear speed in mm/s — the firmware
/// scales the slower wheel from the radius, so the reference must always
/// be the outer wheel.
pub fn derive_velocity(linear: f64, angular: f64, wheelbase: f64) -> (i16, i16) {
    let radius = if angular == 0.0 {
        0
    } else if linear == 0.0 && angular > 0.0 {
        1
    } else if linear == 0.0 && angular < 0.0 {
        -1
    } else {
        (linear * 1000.0 / angular).round() as i16
    };

    let left = linear - wheelbase * angular / 2.0;
    let right = linear + wheelbase * angular / 2.0;
    let speed = (1000.0 * right.max(left)).round() as i16;

    (speed, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::checksum::frame_is_valid;
    use crate::protocol::command::Command;
    use crate::protocol::framer::Framer;

    #[test]
    fn test_velocity_frame_layout() {
        let frame = encode_velocity_command(500, 0);
        assert_eq!(frame.len(), 9);
        assert_eq!(&frame[..4], &[0xAA, 0x55, 0x05, 0x01]);
        assert_eq!(&frame[4..6], &500i16.to_le_bytes());
        assert_eq!(&frame[6..8], &0i16.to_le_bytes());
    }

    #[test]
    fn test_velocity_frame_checksum_round_trip() {
        for (speed, radius) in [(0, 0), (500, 0), (-200, 1), (32767, -32768), (-1, -1)] {
            let frame = encode_velocity_command(speed, radius);
            assert!(
                frame_is_valid(&frame),
                "frame for ({}, {}) does not fold to zero",
                speed,
                radius
            );
        }
    }

    #[test]
    fn test_velocity_frame_negative_values_little_endian() {
        let frame = encode_velocity_command(-200, -1);
        assert_eq!(&frame[4..6], &[0x38, 0xFF]);
        assert_eq!(&frame[6..8], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_generic_command_length_backpatched() {
        let frame = encode_command(&Command::BaseControl { speed: 100, radius: 0 }).unwrap();
        // id + speed + radius = 5 payload bytes
        assert_eq!(frame[2], 5);
        assert_eq!(frame.len(), 2 + 1 + 5 + 1);
        assert!(frame_is_valid(&frame));
    }

    #[test]
    fn test_generic_command_parses_as_inbound_frame() {
        // The outbound checksum rule must satisfy the inbound framer
        let frame = encode_command(&Command::Sound { note: 440, duration: 3 }).unwrap();

        let mut framer = Framer::new();
        let frames = framer.update(&frame);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0][1], 0x03); // sound command id leads the payload
    }

    #[test]
    fn test_generic_command_serializer_failure_propagates() {
        let result = encode_command(&Command::SoundSequence { sequence: 99 });
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_velocity_straight() {
        let (speed, radius) = derive_velocity(0.5, 0.0, 0.298);
        assert_eq!(radius, 0);
        assert_eq!(speed, 500);
    }

    #[test]
    fn test_derive_velocity_pure_rotation() {
        let (speed_ccw, radius_ccw) = derive_velocity(0.0, 1.0, 0.298);
        assert_eq!(radius_ccw, 1);
        // Faster wheel for a left turn in place is the right wheel
        assert_eq!(speed_ccw, 149);

        let (_, radius_cw) = derive_velocity(0.0, -1.0, 0.298);
        assert_eq!(radius_cw, -1);
    }

    #[test]
    fn test_derive_velocity_arc() {
        let (speed, radius) = derive_velocity(0.3, 1.0, 0.298);
        assert_eq!(radius, 300);
        // Outer wheel: 0.3 + 0.298 / 2 = 0.449 m/s
        assert_eq!(speed, 449);
    }

    #[test]
    fn test_derive_velocity_zero_twist() {
        assert_eq!(derive_velocity(0.0, 0.0, 0.298), (0, 0));
    }
}
