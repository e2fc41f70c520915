//! # Outbound Commands
//!
//! Tagged commands the host can send to the base controller, and the
//! serializer that turns them into frame payload bytes.
//!
//! The frame encoder (`encoder.rs`) only needs something implementing
//! [`SerializeCommand`]; the [`Command`] enum is the concrete command set
//! the base understands. Multi-byte fields are little-endian, matching the
//! inbound direction.

use crate::error::{BaseBridgeError, Result};

/// Highest preset sound sequence index the base firmware knows
pub const MAX_SOUND_SEQUENCE: u8 = 6;

/// Serializer for tagged command payloads
///
/// Appends the command's header id and payload bytes to `buf`. Returns an
/// error (and leaves partial bytes for the caller to discard) when the
/// command cannot be represented on the wire.
pub trait SerializeCommand {
    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()>;
}

/// Commands understood by the base controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Motion command: reference wheel speed in mm/s and turn radius in mm
    BaseControl { speed: i16, radius: i16 },
    /// Play a single note
    Sound { note: u16, duration: u8 },
    /// Play one of the preset sound sequences
    SoundSequence { sequence: u8 },
    /// Request one-shot extra data frames
    RequestExtra { flags: u16 },
    /// Drive the general-purpose output lines
    GpOutput { flags: u16 },
}

impl Command {
    /// The wire header id for this command
    pub fn header(&self) -> u8 {
        match self {
            Self::BaseControl { .. } => 0x01,
            Self::Sound { .. } => 0x03,
            Self::SoundSequence { .. } => 0x04,
            Self::RequestExtra { .. } => 0x09,
            Self::GpOutput { .. } => 0x0C,
        }
    }

    /// The motion parameters, when this is a base-control command
    ///
    /// Used to mirror an issued generic motion command back into the
    /// engine's command state.
    pub fn as_base_control(&self) -> Option<(i16, i16)> {
        match *self {
            Self::BaseControl { speed, radius } => Some((speed, radius)),
            _ => None,
        }
    }
}

impl SerializeCommand for Command {
    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.push(self.header());
        match *self {
            Self::BaseControl { speed, radius } => {
                buf.extend_from_slice(&speed.to_le_bytes());
                buf.extend_from_slice(&radius.to_le_bytes());
            }
            Self::Sound { note, duration } => {
                buf.extend_from_slice(&note.to_le_bytes());
                buf.push(duration);
            }
            Self::SoundSequence { sequence } => {
                if sequence > MAX_SOUND_SEQUENCE {
                    return Err(BaseBridgeError::CommandSerialize(format!(
                        "sound sequence {} out of range (0-{})",
                        sequence, MAX_SOUND_SEQUENCE
                    )));
                }
                buf.push(sequence);
            }
            Self::RequestExtra { flags } => {
                buf.extend_from_slice(&flags.to_le_bytes());
            }
            Self::GpOutput { flags } => {
                buf.extend_from_slice(&flags.to_le_bytes());
            }
        }
        Ok(())
    }
}
