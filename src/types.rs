bitflags::bitflags! {
    /// Presence bits read from the first F11 query register. Each bit gates
    /// a later, variable-position query block in the discovery walk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OptionalQueries: u8 {
        const QUERY9  = 1 << 3;
        const QUERY11 = 1 << 4;
        const QUERY12 = 1 << 5;
        const QUERY27 = 1 << 6;
        const QUERY28 = 1 << 7;
    }
}

impl Default for OptionalQueries {
    fn default() -> Self {
        OptionalQueries::empty()
    }
}

/// Everything the capability walk learns about a sensor.
///
/// Built once per device and immutable afterwards. Fields guarded by an
/// unset `has_*` predicate stay zero/false and carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorCapabilities {
    pub optional_queries: OptionalQueries,

    /// Raw 3-bit finger-count code. 0..=4 mean code+1 fingers; 5 means 10.
    pub nr_fingers: u8,
    pub has_rel: bool,
    pub has_abs: bool,
    pub has_gestures: bool,
    pub has_sensitivity_adjust: bool,
    pub configurable: bool,

    pub nr_x_electrodes: u8,
    pub nr_y_electrodes: u8,
    pub max_electrodes: u8,

    // Absolute query block.
    pub abs_data_size: u8,
    pub has_anchored_finger: bool,
    pub has_adj_hyst: bool,
    pub has_dribble: bool,
    pub has_bending_correction: bool,
    pub has_large_object_suppression: bool,
    pub has_jitter_filter: bool,

    /// Raw relative query byte, kept unparsed.
    pub rel_query: u8,

    // Gesture query 7.
    pub has_single_tap: bool,
    pub has_tap_n_hold: bool,
    pub has_double_tap: bool,
    pub has_early_tap: bool,
    pub has_flick: bool,
    pub has_press: bool,
    pub has_pinch: bool,
    pub has_chiral: bool,

    // Gesture query 8.
    pub has_palm_det: bool,
    pub has_rotate: bool,
    pub has_touch_shapes: bool,
    pub has_scroll_zones: bool,
    pub has_individual_scroll_zones: bool,
    pub has_mf_scroll: bool,
    pub has_mf_edge_motion: bool,
    pub has_mf_scroll_inertia: bool,

    /// Whether gesture queries 7/8 carried any bits at all; each non-zero
    /// register adds a byte of gesture data to the report packet.
    pub query7_nonzero: bool,
    pub query8_nonzero: bool,

    // Pen query 9.
    pub has_pen: bool,
    pub has_proximity: bool,
    pub has_palm_det_sensitivity: bool,
    pub has_suppress_on_palm_detect: bool,
    pub has_two_pen_thresholds: bool,
    pub has_contact_geometry: bool,
    pub has_pen_hover_discrimination: bool,
    pub has_pen_filters: bool,

    pub nr_touch_shapes: u8,

    // Tuning query 11.
    pub has_z_tuning: bool,
    pub has_algorithm_selection: bool,
    pub has_w_tuning: bool,
    pub has_pitch_info: bool,
    pub has_finger_size: bool,
    pub has_segmentation_aggressiveness: bool,
    pub has_xy_clip: bool,
    pub has_drumming_filter: bool,

    // Tuning query 12.
    pub has_gapless_finger: bool,
    pub has_gapless_finger_tuning: bool,
    pub has_8bit_w: bool,
    pub has_adjustable_mapping: bool,
    pub has_info2: bool,
    pub has_physical_props: bool,
    pub has_finger_limit: bool,
    pub has_linear_coeff_2: bool,

    pub jitter_window_size: u8,
    pub jitter_filter_type: u8,

    // Info2 query.
    pub light_control: u8,
    pub is_clear: bool,
    pub clickpad_props: u8,
    pub mouse_buttons: u8,
    pub has_advanced_gestures: bool,

    /// Sensor dimensions in millimeters (physical-properties block).
    pub x_sensor_size_mm: u16,
    pub y_sensor_size_mm: u16,

    /// Discovered through the chained query-28/36 reads; widens the
    /// attention region by two bytes per finger.
    pub has_acm: bool,
}

impl SensorCapabilities {
    /// Number of finger slots, applying the table exception for code 5.
    pub fn finger_count(&self) -> usize {
        if self.nr_fingers == 5 {
            10
        } else {
            self.nr_fingers as usize + 1
        }
    }
}

/// Derived packet layout for one sensor. Recomputed wholesale when
/// capabilities are rediscovered after a reset, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketGeometry {
    /// Finger slots in the report packet.
    pub finger_count: usize,
    /// Full report packet size in bytes.
    pub packet_size: usize,
    /// Minimum bytes the transport must deliver per attention event.
    pub attention_size: usize,
    /// Bytes of the 2-bit-per-slot finger-state region.
    pub state_size: usize,
    /// Byte offset of the absolute position data.
    pub abs_offset: usize,
    /// Byte offset of the relative motion data, when present.
    pub rel_offset: Option<usize>,
}

/// 2-bit per-slot state code from the finger-state region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerState {
    #[default]
    None,
    Present,
    /// Reported with reduced accuracy; still treated as a contact.
    Inaccurate,
    /// Undefined code; the slot is skipped and logged.
    Reserved,
}

impl FingerState {
    pub fn from_code(code: u8) -> FingerState {
        match code & 0x03 {
            0 => FingerState::None,
            1 => FingerState::Present,
            2 => FingerState::Inaccurate,
            _ => FingerState::Reserved,
        }
    }

    /// Whether this state carries usable contact data.
    pub fn is_contact(self) -> bool {
        matches!(self, FingerState::Present | FingerState::Inaccurate)
    }
}

/// One decoded absolute-position slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsObject {
    pub state: FingerState,
    /// 12-bit sensor coordinates.
    pub x: u16,
    pub y: u16,
    /// 8-bit pressure proxy.
    pub z: u8,
    /// 4-bit contact widths.
    pub wx: u8,
    pub wy: u8,
}

/// One decoded frame, reused across attention events.
///
/// The session owns the buffer and passes it explicitly through decode and
/// tracking; the tracker zeroes it after consumption so a smaller next frame
/// cannot leak stale slots.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub timestamp_us: u64,
    /// Slots actually present in this packet. Bounded by buffer size, not
    /// capability: an undersized buffer means fewer fingers, not an error.
    pub fingers: usize,
    pub objs: [AbsObject; MAX_FINGERS],
}

impl FrameReport {
    pub fn clear(&mut self) {
        *self = FrameReport::default();
    }
}

/// Largest slot count any F11 sensor reports (finger-count code 5).
pub const MAX_FINGERS: usize = 10;

/// Logical finger roles, matching the magic-trackpad finger-type enumeration
/// downstream consumers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerType {
    #[default]
    Undefined,
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl FingerType {
    /// Pool order for ordinary role assignment. The thumb is never drawn
    /// here; it is only assigned by election.
    pub(crate) const POOL: [FingerType; 4] = [
        FingerType::Index,
        FingerType::Middle,
        FingerType::Ring,
        FingerType::Little,
    ];
}

/// One tracked contact in an emitted frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedContact {
    /// False for empty slots and for contacts rejected as palms.
    pub valid: bool,
    pub finger_type: FingerType,
    /// Top-left-origin coordinates (y inverted against the sensor max).
    pub x: u16,
    pub y: u16,
    /// Contact width derived from the pressure sample.
    pub width: u16,
    /// 255 while the force-touch latch holds, otherwise 0.
    pub pressure: u8,
    /// Physical button state, masked while latched.
    pub button_down: bool,
}

/// Normalized multitouch frame delivered to the downstream consumer.
#[derive(Debug, Clone, Default)]
pub struct ContactFrame {
    pub timestamp_us: u64,
    /// Slots carried in this frame, valid or not.
    pub contact_count: usize,
    pub contacts: [TrackedContact; MAX_FINGERS],
}

/// Tunables for tracking and suppression. Supplied already parsed; the
/// palm-rejection thresholds are hardware-dependent heuristics and therefore
/// configurable rather than baked in.
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    /// Window after keyboard activity during which frames are discarded.
    pub typing_guard_us: u64,
    /// Pressure above which a clicked single contact latches.
    pub force_touch_min_pressure: u8,
    pub force_touch_emulation: bool,
    /// Contacts above this pressure with near-equal widths are palms.
    pub palm_pressure_ceiling: u8,
    pub palm_width_delta: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            typing_guard_us: 500_000,
            force_touch_min_pressure: 80,
            force_touch_emulation: true,
            palm_pressure_ceiling: 120,
            palm_width_delta: 3,
        }
    }
}
