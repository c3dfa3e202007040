//! Packet layout derivation.
//!
//! A sensor's report packet is assembled from optional regions whose
//! presence the capability walk discovered; the byte size accumulates in a
//! fixed order. The attention size is pinned once the absolute region has
//! been counted: later optional regions grow the packet but not the minimum
//! block the transport must deliver per attention event.

use crate::types::{PacketGeometry, SensorCapabilities};

/// Bytes per finger slot in the absolute position region.
pub const ABS_BYTES: usize = 5;
/// Bytes per finger slot in the relative motion region.
pub const REL_BYTES: usize = 2;

fn div_round_up(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

/// Derive the packet geometry for a discovered sensor. Pure; re-run in full
/// whenever capabilities are rediscovered after a reset.
pub fn packet_geometry(caps: &SensorCapabilities) -> PacketGeometry {
    let finger_count = caps.finger_count();
    let state_size = div_round_up(finger_count, 4);

    let mut packet_size = state_size;
    let mut attention_size = 0;
    let abs_offset = state_size;
    let mut rel_offset = None;

    if caps.has_abs {
        packet_size += finger_count * ABS_BYTES;
        attention_size = packet_size;
    }

    if caps.has_rel {
        rel_offset = Some(packet_size);
        packet_size += finger_count * REL_BYTES;
    }

    if caps.query7_nonzero {
        packet_size += 1;
    }

    if caps.query7_nonzero || caps.query8_nonzero {
        packet_size += 1;
    }

    if caps.has_pinch || caps.has_flick || caps.has_rotate {
        packet_size += 3;
        if !caps.has_flick {
            packet_size -= 1;
        }
        if !caps.has_rotate {
            packet_size -= 1;
        }
    }

    if caps.has_touch_shapes {
        packet_size += div_round_up(caps.nr_touch_shapes as usize + 1, 8);
    }

    // ACM data rides in the attention region without joining the packet.
    if caps.has_acm {
        attention_size += finger_count * REL_BYTES;
    }

    PacketGeometry {
        finger_count,
        packet_size,
        attention_size,
        state_size,
        abs_offset,
        rel_offset,
    }
}
