//! # Sub-Packet Dispatcher
//!
//! Walks one validated frame body, peeling sub-packets off the front by
//! header id and overwriting the matching record in the [`SensorCache`].
//!
//! The input is the frame with its three leading framing bytes (start
//! sequence + length) already stripped: payload followed by the trailing
//! checksum byte. An unrecognized header id makes the rest of the frame
//! untrustworthy, so everything after it is dropped — any valid sub-packets
//! behind it are sacrificed with it.

use std::collections::BTreeSet;

use tracing::debug;

use super::sensors::{
    CliffAdc, CoreSensors, DockIrReadings, Eeprom, GpInput, GyroRaw, Inertia, IrReadings,
    MagnetReadings, MotorCurrent, SensorCache, SensorKind, TimeSync, VersionInfo,
};
use super::CHECKSUM_LEN;

/// Record kinds updated by one frame, iterated in ascending header-id order
pub type UpdatedSet = BTreeSet<SensorKind>;

/// Decode every sub-packet in `body` into `cache`
///
/// `body` is the frame payload plus the trailing checksum byte. Returns
/// the set of record kinds that were overwritten. Corruption (unknown id,
/// or a declared width running past the payload) drops the remainder of
/// the frame but keeps everything decoded before it.
pub fn dispatch(body: &[u8], cache: &mut SensorCache) -> UpdatedSet {
    let mut updated = UpdatedSet::new();
    let mut remaining = body;

    while remaining.len() > CHECKSUM_LEN {
        let id = remaining[0];
        let rest = &remaining[1..];

        let Some(kind) = SensorKind::from_header(id) else {
            debug!("dispatcher: unknown header id 0x{:02X}, dropping {} bytes", id, remaining.len());
            break;
        };

        let width = match kind.width(rest) {
            // The sub-packet must fit in front of the checksum byte
            Some(w) if w + CHECKSUM_LEN <= rest.len() => w,
            _ => {
                debug!("dispatcher: truncated {:?} sub-packet, dropping {} bytes", kind, remaining.len());
                break;
            }
        };

        let data = &rest[..width];
        match kind {
            SensorKind::Core => cache.core = CoreSensors::decode(data),
            SensorKind::Ir => cache.ir = IrReadings::decode(data),
            SensorKind::DockIr => cache.dock_ir = DockIrReadings::decode(data),
            SensorKind::Inertia => cache.inertia = Inertia::decode(data),
            SensorKind::Cliff => cache.cliff = CliffAdc::decode(data),
            SensorKind::Current => cache.current = MotorCurrent::decode(data),
            SensorKind::Magnet => cache.magnet = MagnetReadings::decode(data),
            SensorKind::Hardware => cache.hardware = VersionInfo::decode(data),
            SensorKind::Firmware => cache.firmware = VersionInfo::decode(data),
            SensorKind::Time => cache.time = TimeSync::decode(data),
            SensorKind::Gyro => cache.gyro = GyroRaw::decode(data),
            SensorKind::Eeprom => cache.eeprom = Eeprom::decode(data),
            SensorKind::GpInput => cache.gp_input = GpInput::decode(data),
        }
        updated.insert(kind);
        remaining = &rest[width..];
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Append a sub-packet (header id + payload bytes) to a frame body
    fn push_subpacket(body: &mut Vec<u8>, kind: SensorKind, payload: &[u8]) {
        body.push(kind.header());
        body.extend_from_slice(payload);
    }

    /// Core sub-packet payload with the given encoder/timestamp values
    fn core_payload(time_stamp: u16, left: u16, right: u16) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&time_stamp.to_le_bytes());
        p.extend_from_slice(&[0, 0, 0]); // bumper, wheel_drop, cliff
        p.extend_from_slice(&left.to_le_bytes());
        p.extend_from_slice(&right.to_le_bytes());
        p.extend_from_slice(&[0, 0, 0, 0, 0]); // pwm x2, buttons, charger, battery
        p
    }

    #[test]
    fn test_single_core_subpacket() {
        let mut body = Vec::new();
        push_subpacket(&mut body, SensorKind::Core, &core_payload(500, 1000, 2000));
        body.push(0x00); // checksum byte, ignored here

        let mut cache = SensorCache::default();
        let updated = dispatch(&body, &mut cache);

        assert_eq!(updated.len(), 1);
        assert!(updated.contains(&SensorKind::Core));
        assert_eq!(cache.core.time_stamp, 500);
        assert_eq!(cache.core.left_encoder, 1000);
        assert_eq!(cache.core.right_encoder, 2000);
    }

    #[test]
    fn test_multiple_subpackets_ascending_notification_order() {
        // Arrival order deliberately scrambled: firmware, core, cliff
        let mut body = Vec::new();
        push_subpacket(&mut body, SensorKind::Firmware, &[3, 2, 1, 0]);
        push_subpacket(&mut body, SensorKind::Core, &core_payload(1, 2, 3));
        push_subpacket(&mut body, SensorKind::Cliff, &[1, 0, 2, 0, 3, 0]);
        body.push(0x00);

        let mut cache = SensorCache::default();
        let updated = dispatch(&body, &mut cache);

        let order: Vec<SensorKind> = updated.iter().copied().collect();
        assert_eq!(
            order,
            vec![SensorKind::Core, SensorKind::Cliff, SensorKind::Firmware]
        );
        assert_eq!(cache.firmware.major, 1);
        assert_eq!(cache.cliff.values, [1, 2, 3]);
    }

    #[test]
    fn test_unknown_id_sacrifices_rest_of_frame() {
        let mut body = Vec::new();
        push_subpacket(&mut body, SensorKind::Core, &core_payload(9, 8, 7));
        body.push(0xEE); // unknown header id
        push_subpacket(&mut body, SensorKind::Cliff, &[1, 0, 2, 0, 3, 0]);
        body.push(0x00);

        let mut cache = SensorCache::default();
        let updated = dispatch(&body, &mut cache);

        // Core survives, the cliff packet behind the corruption does not
        assert!(updated.contains(&SensorKind::Core));
        assert!(!updated.contains(&SensorKind::Cliff));
        assert_eq!(cache.core.time_stamp, 9);
        assert_eq!(cache.cliff, CliffAdc::default());
    }

    #[test]
    fn test_truncated_subpacket_dropped() {
        // Cliff declares 6 payload bytes but only 3 fit before the checksum
        let mut body = vec![SensorKind::Cliff.header(), 1, 0, 2];
        body.push(0x00);

        let mut cache = SensorCache::default();
        let updated = dispatch(&body, &mut cache);

        assert!(updated.is_empty());
        assert_eq!(cache.cliff, CliffAdc::default());
    }

    #[test]
    fn test_duplicate_id_last_value_wins() {
        let mut body = Vec::new();
        push_subpacket(&mut body, SensorKind::Current, &[10, 20]);
        push_subpacket(&mut body, SensorKind::Current, &[30, 40]);
        body.push(0x00);

        let mut cache = SensorCache::default();
        let updated = dispatch(&body, &mut cache);

        assert_eq!(updated.len(), 1);
        assert_eq!(cache.current.left, 30);
        assert_eq!(cache.current.right, 40);
    }

    #[test]
    fn test_checksum_byte_alone_yields_nothing() {
        let mut cache = SensorCache::default();
        assert!(dispatch(&[0x00], &mut cache).is_empty());
        assert!(dispatch(&[], &mut cache).is_empty());
    }

    #[test]
    fn test_variable_width_gyro_in_frame() {
        let mut gyro = vec![0x05, 0x01];
        for v in [11i16, -22, 33] {
            gyro.extend_from_slice(&v.to_le_bytes());
        }

        let mut body = Vec::new();
        push_subpacket(&mut body, SensorKind::Gyro, &gyro);
        push_subpacket(&mut body, SensorKind::Time, &[0x10, 0x27]);
        body.push(0x00);

        let mut cache = SensorCache::default();
        let updated = dispatch(&body, &mut cache);

        assert_eq!(updated.len(), 2);
        assert_eq!(cache.gyro.samples, vec![[11, -22, 33]]);
        assert_eq!(cache.time.timer, 10000);
    }
}
