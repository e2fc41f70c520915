//! # Sensor Sub-Packets
//!
//! Typed records for every sensor sub-packet the base controller emits,
//! plus the registry mapping one-byte header ids onto decode widths.
//!
//! A frame payload is a concatenation of sub-packets, each a header id
//! followed by a type-specific number of bytes. Decoding a sub-packet is
//! all-or-nothing: a record is only overwritten once its full width has
//! been consumed. All multi-byte fields are little-endian.

use serde::Serialize;

/// Every sub-packet kind the registry recognizes, in ascending header-id
/// order (the derived `Ord` follows declaration order, which notification
/// ordering relies on)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SensorKind {
    /// Default/core telemetry: encoders, bumpers, battery
    Core,
    /// IR receivers
    Ir,
    /// Docking-station IR receivers
    DockIr,
    /// Inertial measurement (heading angle + rate)
    Inertia,
    /// Cliff sensor ADC values
    Cliff,
    /// Wheel motor currents
    Current,
    /// Magnetometer
    Magnet,
    /// Hardware version
    Hardware,
    /// Firmware version
    Firmware,
    /// Controller millisecond timer
    Time,
    /// Raw gyro sample batch (variable width)
    Gyro,
    /// EEPROM contents
    Eeprom,
    /// General-purpose input lines
    GpInput,
}

impl SensorKind {
    /// Map a wire header id onto a record kind
    pub fn from_header(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::Core),
            0x02 => Some(Self::Ir),
            0x03 => Some(Self::DockIr),
            0x04 => Some(Self::Inertia),
            0x05 => Some(Self::Cliff),
            0x06 => Some(Self::Current),
            0x07 => Some(Self::Magnet),
            0x08 => Some(Self::Hardware),
            0x09 => Some(Self::Firmware),
            0x0A => Some(Self::Time),
            0x0B => Some(Self::Gyro),
            0x0C => Some(Self::Eeprom),
            0x0D => Some(Self::GpInput),
            _ => None,
        }
    }

    /// The wire header id for this kind
    pub fn header(&self) -> u8 {
        match self {
            Self::Core => 0x01,
            Self::Ir => 0x02,
            Self::DockIr => 0x03,
            Self::Inertia => 0x04,
            Self::Cliff => 0x05,
            Self::Current => 0x06,
            Self::Magnet => 0x07,
            Self::Hardware => 0x08,
            Self::Firmware => 0x09,
            Self::Time => 0x0A,
            Self::Gyro => 0x0B,
            Self::Eeprom => 0x0C,
            Self::GpInput => 0x0D,
        }
    }

    /// Number of payload bytes following the header id, derived from the
    /// bytes remaining in the frame for variable-width kinds
    ///
    /// Returns `None` when a variable-width sub-packet does not carry
    /// enough bytes to even declare its own size.
    pub fn width(&self, rest: &[u8]) -> Option<usize> {
        match self {
            Self::Core => Some(14),
            Self::Ir | Self::DockIr | Self::Magnet => Some(3),
            Self::Inertia => Some(7),
            Self::Cliff => Some(6),
            Self::Current | Self::Time => Some(2),
            Self::Hardware | Self::Firmware => Some(4),
            Self::Gyro => {
                // frame_id + sample count, then 3 x i16 per sample
                if rest.len() < 2 {
                    return None;
                }
                Some(2 + 6 * rest[1] as usize)
            }
            Self::Eeprom => Some(16),
            Self::GpInput => Some(10),
        }
    }
}

/// Default/core telemetry record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CoreSensors {
    /// Controller millisecond timer (wraps at 2^16)
    pub time_stamp: u16,
    /// Bumper contact bitfield
    pub bumper: u8,
    /// Wheel-drop bitfield
    pub wheel_drop: u8,
    /// Cliff detection bitfield
    pub cliff: u8,
    /// Left wheel encoder count (wraps at 2^16)
    pub left_encoder: u16,
    /// Right wheel encoder count (wraps at 2^16)
    pub right_encoder: u16,
    /// Left wheel PWM duty
    pub left_pwm: i8,
    /// Right wheel PWM duty
    pub right_pwm: i8,
    /// Button bitfield
    pub buttons: u8,
    /// Charger state
    pub charger: u8,
    /// Battery voltage in 0.1 V
    pub battery: u8,
}

impl CoreSensors {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            time_stamp: u16::from_le_bytes([buf[0], buf[1]]),
            bumper: buf[2],
            wheel_drop: buf[3],
            cliff: buf[4],
            left_encoder: u16::from_le_bytes([buf[5], buf[6]]),
            right_encoder: u16::from_le_bytes([buf[7], buf[8]]),
            left_pwm: buf[9] as i8,
            right_pwm: buf[10] as i8,
            buttons: buf[11],
            charger: buf[12],
            battery: buf[13],
        }
    }
}

/// IR receiver readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IrReadings {
    pub receivers: [u8; 3],
}

impl IrReadings {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            receivers: [buf[0], buf[1], buf[2]],
        }
    }
}

/// Docking-station IR receiver readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DockIrReadings {
    pub receivers: [u8; 3],
}

impl DockIrReadings {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            receivers: [buf[0], buf[1], buf[2]],
        }
    }
}

/// Inertial measurement record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Inertia {
    /// Heading angle in hundredths of a degree
    pub angle: i16,
    /// Heading rate in hundredths of a degree per second
    pub angle_rate: i16,
    /// Raw acceleration, one byte per axis
    pub acc: [u8; 3],
}

impl Inertia {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            angle: i16::from_le_bytes([buf[0], buf[1]]),
            angle_rate: i16::from_le_bytes([buf[2], buf[3]]),
            acc: [buf[4], buf[5], buf[6]],
        }
    }
}

/// Cliff sensor ADC values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CliffAdc {
    pub values: [u16; 3],
}

impl CliffAdc {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            values: [
                u16::from_le_bytes([buf[0], buf[1]]),
                u16::from_le_bytes([buf[2], buf[3]]),
                u16::from_le_bytes([buf[4], buf[5]]),
            ],
        }
    }
}

/// Wheel motor currents
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MotorCurrent {
    pub left: u8,
    pub right: u8,
}

impl MotorCurrent {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            left: buf[0],
            right: buf[1],
        }
    }
}

/// Magnetometer readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MagnetReadings {
    pub axes: [u8; 3],
}

impl MagnetReadings {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            axes: [buf[0], buf[1], buf[2]],
        }
    }
}

/// Hardware or firmware version triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VersionInfo {
    pub patch: u8,
    pub minor: u8,
    pub major: u8,
}

impl VersionInfo {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        // buf[3] is reserved padding
        Self {
            patch: buf[0],
            minor: buf[1],
            major: buf[2],
        }
    }
}

/// Controller millisecond timer sub-packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeSync {
    pub timer: u16,
}

impl TimeSync {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            timer: u16::from_le_bytes([buf[0], buf[1]]),
        }
    }
}

/// Raw gyro sample batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GyroRaw {
    pub frame_id: u8,
    /// One `[x, y, z]` triple per sample
    pub samples: Vec<[i16; 3]>,
}

impl GyroRaw {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        let count = buf[1] as usize;
        let mut samples = Vec::with_capacity(count);
        for i in 0..count {
            let base = 2 + 6 * i;
            samples.push([
                i16::from_le_bytes([buf[base], buf[base + 1]]),
                i16::from_le_bytes([buf[base + 2], buf[base + 3]]),
                i16::from_le_bytes([buf[base + 4], buf[base + 5]]),
            ]);
        }
        Self {
            frame_id: buf[0],
            samples,
        }
    }
}

/// EEPROM contents
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Eeprom {
    pub bytes: [u8; 16],
}

impl Default for Eeprom {
    fn default() -> Self {
        Self { bytes: [0; 16] }
    }
}

impl Eeprom {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&buf[..16]);
        Self { bytes }
    }
}

/// General-purpose input lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GpInput {
    pub digital: u16,
    pub analog: [u16; 4],
}

impl GpInput {
    pub(crate) fn decode(buf: &[u8]) -> Self {
        Self {
            digital: u16::from_le_bytes([buf[0], buf[1]]),
            analog: [
                u16::from_le_bytes([buf[2], buf[3]]),
                u16::from_le_bytes([buf[4], buf[5]]),
                u16::from_le_bytes([buf[6], buf[7]]),
                u16::from_le_bytes([buf[8], buf[9]]),
            ],
        }
    }
}

/// Last-known decoded value for every record kind
///
/// Each field is overwritten whenever its header id reappears in a frame;
/// a record is never partially updated. Cloned wholesale to hand consumers
/// a snapshot that can never alias mid-decode state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorCache {
    pub core: CoreSensors,
    pub ir: IrReadings,
    pub dock_ir: DockIrReadings,
    pub inertia: Inertia,
    pub cliff: CliffAdc,
    pub current: MotorCurrent,
    pub magnet: MagnetReadings,
    pub hardware: VersionInfo,
    pub firmware: VersionInfo,
    pub time: TimeSync,
    pub gyro: GyroRaw,
    pub eeprom: Eeprom,
    pub gp_input: GpInput,
}
