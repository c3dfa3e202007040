//! Capability discovery for F11 sensors.
//!
//! The query region is self-describing: a presence header gates later,
//! variable-position blocks, and two of those blocks gate further reads of
//! their own. The total byte length of the region is only known once the
//! walk completes, so it is returned to the caller for positioning any
//! subsequent reads.

use crate::port::RegisterPort;
use crate::types::{OptionalQueries, SensorCapabilities};
use crate::Result;

/// Base query block: finger count/feature bits plus three electrode counts.
const QUERY_BASE_SIZE: u16 = 4;
const QUERY_GESTURE_SIZE: usize = 2;

// Query 1.
const NR_FINGERS_MASK: u8 = 0x07;
const HAS_REL: u8 = 1 << 3;
const HAS_ABS: u8 = 1 << 4;
const HAS_GESTURES: u8 = 1 << 5;
const HAS_SENSITIVITY_ADJ: u8 = 1 << 6;
const CONFIGURABLE: u8 = 1 << 7;

const NR_ELECTRODES_MASK: u8 = 0x7f;

// Absolute query block.
const ABS_DATA_SIZE_MASK: u8 = 0x03;
const HAS_ANCHORED_FINGER: u8 = 1 << 2;
const HAS_ADJ_HYST: u8 = 1 << 3;
const HAS_DRIBBLE: u8 = 1 << 4;
const HAS_BENDING_CORRECTION: u8 = 1 << 5;
const HAS_LARGE_OBJECT_SUPPRESSION: u8 = 1 << 6;
const HAS_JITTER_FILTER: u8 = 1 << 7;

// Gesture query 7.
const HAS_SINGLE_TAP: u8 = 1 << 0;
const HAS_TAP_AND_HOLD: u8 = 1 << 1;
const HAS_DOUBLE_TAP: u8 = 1 << 2;
const HAS_EARLY_TAP: u8 = 1 << 3;
const HAS_FLICK: u8 = 1 << 4;
const HAS_PRESS: u8 = 1 << 5;
const HAS_PINCH: u8 = 1 << 6;
const HAS_CHIRAL: u8 = 1 << 7;

// Gesture query 8.
const HAS_PALM_DET: u8 = 1 << 0;
const HAS_ROTATE: u8 = 1 << 1;
const HAS_TOUCH_SHAPES: u8 = 1 << 2;
const HAS_SCROLL_ZONES: u8 = 1 << 3;
const HAS_INDIVIDUAL_SCROLL_ZONES: u8 = 1 << 4;
const HAS_MF_SCROLL: u8 = 1 << 5;
const HAS_MF_EDGE_MOTION: u8 = 1 << 6;
const HAS_MF_SCROLL_INERTIA: u8 = 1 << 7;

// Pen query 9.
const HAS_PEN: u8 = 1 << 0;
const HAS_PROXIMITY: u8 = 1 << 1;
const HAS_PALM_DET_SENSITIVITY: u8 = 1 << 2;
const HAS_SUPPRESS_ON_PALM_DETECT: u8 = 1 << 3;
const HAS_TWO_PEN_THRESHOLDS: u8 = 1 << 4;
const HAS_CONTACT_GEOMETRY: u8 = 1 << 5;
const HAS_PEN_HOVER_DISCRIMINATION: u8 = 1 << 6;
const HAS_PEN_FILTERS: u8 = 1 << 7;

const NR_TOUCH_SHAPES_MASK: u8 = 0x1f;

// Tuning query 11.
const HAS_Z_TUNING: u8 = 1 << 0;
const HAS_ALGORITHM_SELECTION: u8 = 1 << 1;
const HAS_W_TUNING: u8 = 1 << 2;
const HAS_PITCH_INFO: u8 = 1 << 3;
const HAS_FINGER_SIZE: u8 = 1 << 4;
const HAS_SEGMENTATION_AGGRESSIVENESS: u8 = 1 << 5;
const HAS_XY_CLIP: u8 = 1 << 6;
const HAS_DRUMMING_FILTER: u8 = 1 << 7;

// Tuning query 12.
const HAS_GAPLESS_FINGER: u8 = 1 << 0;
const HAS_GAPLESS_FINGER_TUNING: u8 = 1 << 1;
const HAS_8BIT_W: u8 = 1 << 2;
const HAS_ADJUSTABLE_MAPPING: u8 = 1 << 3;
const HAS_INFO2: u8 = 1 << 4;
const HAS_PHYSICAL_PROPS: u8 = 1 << 5;
const HAS_FINGER_LIMIT: u8 = 1 << 6;
const HAS_LINEAR_COEFF: u8 = 1 << 7;

const JITTER_WINDOW_MASK: u8 = 0x1f;
const JITTER_FILTER_MASK: u8 = 0x60;
const JITTER_FILTER_SHIFT: u8 = 5;

// Info2 query.
const LIGHT_CONTROL_MASK: u8 = 0x03;
const IS_CLEAR: u8 = 1 << 2;
const CLICKPAD_PROPS_MASK: u8 = 0x18;
const CLICKPAD_PROPS_SHIFT: u8 = 3;
const MOUSE_BUTTONS_MASK: u8 = 0x60;
const MOUSE_BUTTONS_SHIFT: u8 = 5;
const HAS_ADVANCED_GESTURES: u8 = 1 << 7;

/// Queries 15-18 hold the sensor size and 19-26 the bezel dimensions; the
/// walk parses the four size bytes and skips the rest unread.
const PHYSICAL_PROPS_SKIP: u16 = 12;

const QUERY28_HAS_QUERY36: u8 = 1 << 6;
const QUERY36_HAS_ACM: u8 = 1 << 5;

/// Run the full capability walk starting at the sensor's query base address.
///
/// Returns the capabilities plus the number of query bytes consumed
/// (presence header included), so the caller can position reads of whatever
/// follows the query region. Any transport failure aborts the walk; nothing
/// partial is returned.
pub fn discover<P: RegisterPort>(
    port: &mut P,
    query_base: u16,
) -> Result<(SensorCapabilities, u16)> {
    let header = port.read(query_base)?;
    let optional = OptionalQueries::from_bits_truncate(header);

    let (caps, walked) = walk(port, query_base + 1, optional)?;
    Ok((caps, walked + 1))
}

/// Walk the conditionally-present query blocks at `base` (one past the
/// presence header) and return the parsed capabilities together with the
/// region's byte length.
pub fn walk<P: RegisterPort>(
    port: &mut P,
    base: u16,
    optional: OptionalQueries,
) -> Result<(SensorCapabilities, u16)> {
    let mut caps = SensorCapabilities {
        optional_queries: optional,
        ..SensorCapabilities::default()
    };
    let mut buf = [0u8; QUERY_BASE_SIZE as usize];

    port.read_block(base, &mut buf)?;

    caps.nr_fingers = buf[0] & NR_FINGERS_MASK;
    caps.has_rel = buf[0] & HAS_REL != 0;
    caps.has_abs = buf[0] & HAS_ABS != 0;
    caps.has_gestures = buf[0] & HAS_GESTURES != 0;
    caps.has_sensitivity_adjust = buf[0] & HAS_SENSITIVITY_ADJ != 0;
    caps.configurable = buf[0] & CONFIGURABLE != 0;

    caps.nr_x_electrodes = buf[1] & NR_ELECTRODES_MASK;
    caps.nr_y_electrodes = buf[2] & NR_ELECTRODES_MASK;
    caps.max_electrodes = buf[3] & NR_ELECTRODES_MASK;

    let mut query_size: u16 = QUERY_BASE_SIZE;

    if caps.has_abs {
        let b = port.read(base + query_size)?;
        caps.abs_data_size = b & ABS_DATA_SIZE_MASK;
        caps.has_anchored_finger = b & HAS_ANCHORED_FINGER != 0;
        caps.has_adj_hyst = b & HAS_ADJ_HYST != 0;
        caps.has_dribble = b & HAS_DRIBBLE != 0;
        caps.has_bending_correction = b & HAS_BENDING_CORRECTION != 0;
        caps.has_large_object_suppression = b & HAS_LARGE_OBJECT_SUPPRESSION != 0;
        caps.has_jitter_filter = b & HAS_JITTER_FILTER != 0;
        query_size += 1;
    }

    if caps.has_rel {
        caps.rel_query = port.read(base + query_size)?;
        query_size += 1;
    }

    if caps.has_gestures {
        let mut gesture = [0u8; QUERY_GESTURE_SIZE];
        port.read_block(base + query_size, &mut gesture)?;

        caps.has_single_tap = gesture[0] & HAS_SINGLE_TAP != 0;
        caps.has_tap_n_hold = gesture[0] & HAS_TAP_AND_HOLD != 0;
        caps.has_double_tap = gesture[0] & HAS_DOUBLE_TAP != 0;
        caps.has_early_tap = gesture[0] & HAS_EARLY_TAP != 0;
        caps.has_flick = gesture[0] & HAS_FLICK != 0;
        caps.has_press = gesture[0] & HAS_PRESS != 0;
        caps.has_pinch = gesture[0] & HAS_PINCH != 0;
        caps.has_chiral = gesture[0] & HAS_CHIRAL != 0;

        caps.has_palm_det = gesture[1] & HAS_PALM_DET != 0;
        caps.has_rotate = gesture[1] & HAS_ROTATE != 0;
        caps.has_touch_shapes = gesture[1] & HAS_TOUCH_SHAPES != 0;
        caps.has_scroll_zones = gesture[1] & HAS_SCROLL_ZONES != 0;
        caps.has_individual_scroll_zones = gesture[1] & HAS_INDIVIDUAL_SCROLL_ZONES != 0;
        caps.has_mf_scroll = gesture[1] & HAS_MF_SCROLL != 0;
        caps.has_mf_edge_motion = gesture[1] & HAS_MF_EDGE_MOTION != 0;
        caps.has_mf_scroll_inertia = gesture[1] & HAS_MF_SCROLL_INERTIA != 0;

        caps.query7_nonzero = gesture[0] != 0;
        caps.query8_nonzero = gesture[1] != 0;

        query_size += QUERY_GESTURE_SIZE as u16;
    }

    if optional.contains(OptionalQueries::QUERY9) {
        let b = port.read(base + query_size)?;
        caps.has_pen = b & HAS_PEN != 0;
        caps.has_proximity = b & HAS_PROXIMITY != 0;
        caps.has_palm_det_sensitivity = b & HAS_PALM_DET_SENSITIVITY != 0;
        caps.has_suppress_on_palm_detect = b & HAS_SUPPRESS_ON_PALM_DETECT != 0;
        caps.has_two_pen_thresholds = b & HAS_TWO_PEN_THRESHOLDS != 0;
        caps.has_contact_geometry = b & HAS_CONTACT_GEOMETRY != 0;
        caps.has_pen_hover_discrimination = b & HAS_PEN_HOVER_DISCRIMINATION != 0;
        caps.has_pen_filters = b & HAS_PEN_FILTERS != 0;
        query_size += 1;
    }

    if caps.has_touch_shapes {
        caps.nr_touch_shapes = port.read(base + query_size)? & NR_TOUCH_SHAPES_MASK;
        query_size += 1;
    }

    if optional.contains(OptionalQueries::QUERY11) {
        let b = port.read(base + query_size)?;
        caps.has_z_tuning = b & HAS_Z_TUNING != 0;
        caps.has_algorithm_selection = b & HAS_ALGORITHM_SELECTION != 0;
        caps.has_w_tuning = b & HAS_W_TUNING != 0;
        caps.has_pitch_info = b & HAS_PITCH_INFO != 0;
        caps.has_finger_size = b & HAS_FINGER_SIZE != 0;
        caps.has_segmentation_aggressiveness = b & HAS_SEGMENTATION_AGGRESSIVENESS != 0;
        caps.has_xy_clip = b & HAS_XY_CLIP != 0;
        caps.has_drumming_filter = b & HAS_DRUMMING_FILTER != 0;
        query_size += 1;
    }

    if optional.contains(OptionalQueries::QUERY12) {
        let b = port.read(base + query_size)?;
        caps.has_gapless_finger = b & HAS_GAPLESS_FINGER != 0;
        caps.has_gapless_finger_tuning = b & HAS_GAPLESS_FINGER_TUNING != 0;
        caps.has_8bit_w = b & HAS_8BIT_W != 0;
        caps.has_adjustable_mapping = b & HAS_ADJUSTABLE_MAPPING != 0;
        caps.has_info2 = b & HAS_INFO2 != 0;
        caps.has_physical_props = b & HAS_PHYSICAL_PROPS != 0;
        caps.has_finger_limit = b & HAS_FINGER_LIMIT != 0;
        caps.has_linear_coeff_2 = b & HAS_LINEAR_COEFF != 0;
        query_size += 1;
    }

    if caps.has_jitter_filter {
        let b = port.read(base + query_size)?;
        caps.jitter_window_size = b & JITTER_WINDOW_MASK;
        caps.jitter_filter_type = (b & JITTER_FILTER_MASK) >> JITTER_FILTER_SHIFT;
        query_size += 1;
    }

    if caps.has_info2 {
        let b = port.read(base + query_size)?;
        caps.light_control = b & LIGHT_CONTROL_MASK;
        caps.is_clear = b & IS_CLEAR != 0;
        caps.clickpad_props = (b & CLICKPAD_PROPS_MASK) >> CLICKPAD_PROPS_SHIFT;
        caps.mouse_buttons = (b & MOUSE_BUTTONS_MASK) >> MOUSE_BUTTONS_SHIFT;
        caps.has_advanced_gestures = b & HAS_ADVANCED_GESTURES != 0;
        query_size += 1;
    }

    if caps.has_physical_props {
        let mut size = [0u8; 4];
        port.read_block(base + query_size, &mut size)?;
        caps.x_sensor_size_mm = u16::from_le_bytes([size[0], size[1]]) / 10;
        caps.y_sensor_size_mm = u16::from_le_bytes([size[2], size[3]]) / 10;
        query_size += PHYSICAL_PROPS_SKIP;
    }

    if optional.contains(OptionalQueries::QUERY27) {
        query_size += 1;
    }

    // The tail of the walk mirrors the reference driver byte for byte,
    // including the reads that do not advance the cursor. The pairing of
    // queries 28 and 36 has not been validated against hardware; do not
    // "fix" the skip amounts without a trace from a real sensor.
    let mut has_query36 = false;
    if optional.contains(OptionalQueries::QUERY28) {
        let b = port.read(base + query_size)?;
        has_query36 = b & QUERY28_HAS_QUERY36 != 0;
    }

    if has_query36 {
        query_size += 2;
        let b = port.read(base + query_size)?;
        if b & QUERY36_HAS_ACM != 0 {
            caps.has_acm = true;
        }
    }

    Ok((caps, query_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{clickpad_query_space, SimPort};

    #[test]
    fn minimal_device_walk() {
        // Header with no optional queries; abs-only device, 2 fingers.
        let mut port = SimPort::new(0x40, &[0x00, 0x11, 0x0a, 0x0b, 0x0c, 0x00]);
        let (caps, consumed) = discover(&mut port, 0x40).unwrap();

        assert_eq!(caps.nr_fingers, 1);
        assert_eq!(caps.finger_count(), 2);
        assert!(caps.has_abs);
        assert!(!caps.has_rel);
        assert_eq!(caps.nr_x_electrodes, 0x0a);
        assert_eq!(caps.nr_y_electrodes, 0x0b);
        assert_eq!(caps.max_electrodes, 0x0c);
        // Header + base block + abs block.
        assert_eq!(consumed, 1 + 4 + 1);
    }

    #[test]
    fn full_walk_consumes_every_block() {
        let mut port = SimPort::new(0x40, &clickpad_query_space());
        let (caps, consumed) = discover(&mut port, 0x40).unwrap();

        assert_eq!(caps.finger_count(), 10);
        assert!(caps.has_abs && caps.has_rel && caps.has_gestures);
        assert!(caps.has_palm_det);
        assert!(caps.query7_nonzero && caps.query8_nonzero);
        assert!(caps.has_jitter_filter);
        assert_eq!(caps.jitter_window_size, 0x15);
        assert_eq!(caps.jitter_filter_type, 2);
        assert!(caps.has_info2);
        assert_eq!(caps.clickpad_props, 1);
        assert!(caps.has_physical_props);
        assert_eq!(caps.x_sensor_size_mm, 102);
        assert_eq!(caps.y_sensor_size_mm, 68);
        assert_eq!(caps.nr_touch_shapes, 4);
        assert!(caps.has_acm);

        // header(1) + base(4) + abs(1) + rel(1) + gestures(2) + query9(1)
        // + shapes(1) + query11(1) + query12(1) + jitter(1) + info2(1)
        // + physical(12) + query27(1) + query36 skip(2)
        assert_eq!(consumed, 1 + 4 + 1 + 1 + 2 + 1 + 1 + 1 + 1 + 1 + 1 + 12 + 1 + 2);
    }

    #[test]
    fn query28_read_does_not_advance_cursor() {
        // Device with only query28 set and no query36 announced: the byte is
        // read in place and the region ends where query27/28 left it.
        let mut port = SimPort::new(0x40, &[0x80, 0x10, 0, 0, 0, 0x01, 0x00]);
        let (caps, consumed) = discover(&mut port, 0x40).unwrap();
        assert!(!caps.has_acm);
        assert_eq!(consumed, 1 + 4 + 1);
    }

    #[test]
    fn chained_query36_sets_acm() {
        // query28 at the cursor announces query36 two bytes ahead, whose
        // bit 5 carries the ACM flag.
        let mut space = vec![0x80, 0x10, 0, 0, 0, 0x01];
        space.push(0x40); // query28: bit6 -> query36 present
        space.push(0x00);
        space.push(0x20); // query36: bit5 -> ACM
        let mut port = SimPort::new(0x40, &space);
        let (caps, consumed) = discover(&mut port, 0x40).unwrap();
        assert!(caps.has_acm);
        assert_eq!(consumed, 1 + 4 + 1 + 2);
    }

    #[test]
    fn walk_is_idempotent() {
        let mut port = SimPort::new(0x40, &clickpad_query_space());
        let first = discover(&mut port, 0x40).unwrap();
        let second = discover(&mut port, 0x40).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_read_aborts_walk() {
        let mut port = SimPort::new(0x40, &clickpad_query_space());
        // Fail inside the gesture block.
        port.fail_at(0x40 + 1 + 4 + 1 + 1);
        assert!(discover(&mut port, 0x40).is_err());
    }
}
