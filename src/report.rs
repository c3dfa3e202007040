//! Attention report decoding.
//!
//! The wire layout is fixed by the device and must be reproduced bit for
//! bit: a 2-bit-per-slot state region followed by five bytes per absolute
//! slot, with x and y each borrowing opposite nibbles of the shared third
//! byte. Decoding never fails; malformed input degrades to fewer or skipped
//! slots so the input pipeline stays live under corrupted data.

use crate::geometry::ABS_BYTES;
use crate::types::{AbsObject, FingerState, FrameReport, PacketGeometry};

/// Extract slot `i`'s 2-bit state code from the finger-state region.
fn finger_state_code(state_region: &[u8], i: usize) -> u8 {
    (state_region[i / 4] >> ((i % 4) * 2)) & 0x03
}

/// Decode a raw attention packet into `report`.
///
/// The effective slot count is clamped to what the buffer can actually
/// hold: an undersized packet reads as fewer fingers, never as an error.
/// RESERVED slot codes are logged and skipped, leaving the slot zeroed.
pub fn decode_into(
    geometry: &PacketGeometry,
    packet: &[u8],
    timestamp_us: u64,
    report: &mut FrameReport,
) {
    report.timestamp_us = timestamp_us;

    let abs_size = geometry.finger_count * ABS_BYTES;
    let fingers = if abs_size > packet.len() {
        packet.len() / ABS_BYTES
    } else {
        geometry.finger_count
    };
    report.fingers = fingers;

    for i in 0..fingers {
        let code = finger_state_code(&packet[..geometry.state_size], i);
        let state = FingerState::from_code(code);
        let obj = &mut report.objs[i];

        if state == FingerState::Reserved {
            log::warn!("invalid finger state[{i}]: 0x{code:02x}");
            continue;
        }
        obj.state = state;

        if !state.is_contact() {
            continue;
        }

        let start = geometry.abs_offset + i * ABS_BYTES;
        let Some(pos) = packet.get(start..start + ABS_BYTES) else {
            break;
        };
        obj.x = (u16::from(pos[0]) << 4) | u16::from(pos[2] & 0x0f);
        obj.y = (u16::from(pos[1]) << 4) | u16::from(pos[2] >> 4);
        obj.wx = pos[3] & 0x0f;
        obj.wy = pos[3] >> 4;
        obj.z = pos[4];
    }
}

/// Pack one absolute slot into its five-byte wire form. The inverse of the
/// decode unpacking, for synthesizing device packets host-side.
pub fn pack_abs_slot(obj: &AbsObject) -> [u8; ABS_BYTES] {
    [
        (obj.x >> 4) as u8,
        (obj.y >> 4) as u8,
        ((obj.y as u8 & 0x0f) << 4) | (obj.x as u8 & 0x0f),
        (obj.wy << 4) | (obj.wx & 0x0f),
        obj.z,
    ]
}

/// Build a full attention packet from per-slot samples, for tests and
/// simulated register spaces.
pub fn pack_packet(geometry: &PacketGeometry, objs: &[AbsObject]) -> Vec<u8> {
    let mut packet = vec![0u8; geometry.packet_size];
    for (i, obj) in objs.iter().enumerate().take(geometry.finger_count) {
        let code = match obj.state {
            FingerState::None => 0u8,
            FingerState::Present => 1,
            FingerState::Inaccurate => 2,
            FingerState::Reserved => 3,
        };
        packet[i / 4] |= code << ((i % 4) * 2);
        packet[geometry.abs_offset + i * ABS_BYTES..][..ABS_BYTES]
            .copy_from_slice(&pack_abs_slot(obj));
    }
    packet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::packet_geometry;
    use crate::types::SensorCapabilities;

    fn ten_finger_geometry() -> PacketGeometry {
        packet_geometry(&SensorCapabilities {
            nr_fingers: 5,
            has_abs: true,
            ..SensorCapabilities::default()
        })
    }

    fn present(x: u16, y: u16, z: u8, wx: u8, wy: u8) -> AbsObject {
        AbsObject {
            state: FingerState::Present,
            x,
            y,
            z,
            wx,
            wy,
        }
    }

    #[test]
    fn nibble_layout_is_exact() {
        // x = b0 << 4 | low nibble of b2, y = b1 << 4 | high nibble of b2.
        let geometry = ten_finger_geometry();
        let mut packet = vec![0u8; geometry.packet_size];
        packet[0] = 0x01; // slot 0 present
        packet[geometry.abs_offset..geometry.abs_offset + 5]
            .copy_from_slice(&[0xab, 0xcd, 0x3e, 0x97, 0x42]);

        let mut report = FrameReport::default();
        decode_into(&geometry, &packet, 0, &mut report);

        let obj = report.objs[0];
        assert_eq!(obj.x, 0xabe);
        assert_eq!(obj.y, 0xcd3);
        assert_eq!(obj.wx, 0x7);
        assert_eq!(obj.wy, 0x9);
        assert_eq!(obj.z, 0x42);
    }

    #[test]
    fn round_trip_spans_field_ranges() {
        let geometry = ten_finger_geometry();
        let mut report = FrameReport::default();

        // Field extremes and a spread of interior values in one packet.
        let samples = [
            present(0, 0, 0, 0, 0),
            present(4095, 4095, 255, 15, 15),
            present(1, 4094, 128, 7, 8),
            present(0x800, 0x001, 1, 15, 0),
            present(0x7ff, 0x800, 254, 0, 15),
            present(1234, 2345, 99, 3, 12),
        ];
        let packet = pack_packet(&geometry, &samples);
        decode_into(&geometry, &packet, 7, &mut report);

        assert_eq!(report.timestamp_us, 7);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(report.objs[i], *sample, "slot {i}");
        }
    }

    #[test]
    fn state_codes_map_per_slot() {
        let geometry = ten_finger_geometry();
        let samples = [
            AbsObject {
                state: FingerState::None,
                ..AbsObject::default()
            },
            present(10, 20, 30, 1, 2),
            AbsObject {
                state: FingerState::Inaccurate,
                x: 5,
                y: 6,
                z: 7,
                wx: 1,
                wy: 1,
            },
        ];
        let packet = pack_packet(&geometry, &samples);
        let mut report = FrameReport::default();
        decode_into(&geometry, &packet, 0, &mut report);

        assert_eq!(report.objs[0].state, FingerState::None);
        assert_eq!(report.objs[1].state, FingerState::Present);
        // Inaccurate still decodes as a contact.
        assert_eq!(report.objs[2].state, FingerState::Inaccurate);
        assert_eq!(report.objs[2].x, 5);
    }

    #[test]
    fn reserved_slot_skipped_without_error() {
        let geometry = ten_finger_geometry();
        let mut packet = vec![0u8; geometry.packet_size];
        packet[0] = 0x03 | (0x01 << 2); // slot 0 reserved, slot 1 present
        packet[geometry.abs_offset..geometry.abs_offset + 5].copy_from_slice(&[9; 5]);
        packet[geometry.abs_offset + 5..geometry.abs_offset + 10]
            .copy_from_slice(&pack_abs_slot(&present(100, 200, 50, 2, 2)));

        let mut report = FrameReport::default();
        decode_into(&geometry, &packet, 0, &mut report);

        // The reserved slot stays zeroed and counts in the slot array.
        assert_eq!(report.objs[0].state, FingerState::None);
        assert_eq!(report.objs[0].x, 0);
        assert_eq!(report.objs[1].x, 100);
        assert_eq!(report.fingers, 10);
    }

    #[test]
    fn short_buffer_truncates_slot_count() {
        // Capability says 10 slots; a buffer of 33 bytes fits only 6
        // five-byte slots.
        let geometry = ten_finger_geometry();
        let packet = vec![0u8; 33];
        let mut report = FrameReport::default();
        decode_into(&geometry, &packet, 0, &mut report);
        assert_eq!(report.fingers, 6);
    }
}
