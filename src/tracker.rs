//! Contact tracking across frames.
//!
//! The tracker turns decoded slot samples into a normalized contact stream:
//! it keeps per-slot logical finger roles stable while a contact stays down,
//! returns roles to a shared pool on lift, and runs the force-touch pressure
//! latch that freezes a clicked contact in place for click emulation.

use crate::types::{
    ContactFrame, FingerType, FrameReport, SensorConfig, TrackedContact, MAX_FINGERS,
};

/// Pressure reported while the force-touch latch holds.
const LATCHED_PRESSURE: u8 = 255;

/// Shared pool of assignable finger roles.
#[derive(Debug)]
struct RolePool {
    thumb_free: bool,
    /// Free flags in draw order (index, middle, ring, little).
    free: [bool; 4],
}

impl RolePool {
    fn new() -> RolePool {
        RolePool {
            thumb_free: true,
            free: [true; 4],
        }
    }

    /// Draw the next free role in enumeration order. The thumb is never
    /// drawn here; it is only assigned by election.
    fn take_next(&mut self) -> FingerType {
        for (i, role) in FingerType::POOL.iter().enumerate() {
            if self.free[i] {
                self.free[i] = false;
                return *role;
            }
        }
        FingerType::Undefined
    }

    fn take_thumb(&mut self) {
        self.thumb_free = false;
    }

    fn release(&mut self, role: FingerType) {
        match role {
            FingerType::Undefined => {}
            FingerType::Thumb => self.thumb_free = true,
            FingerType::Index => self.free[0] = true,
            FingerType::Middle => self.free[1] = true,
            FingerType::Ring => self.free[2] = true,
            FingerType::Little => self.free[3] = true,
        }
    }
}

/// Per-slot state that persists across frames.
#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    valid: bool,
    finger_type: FingerType,
    /// Last reported output coordinates; held in place while latched.
    x: u16,
    y: u16,
}

/// Stateful tracker, one per sensor session. Sole owner of the slot table,
/// the role pool and the pressure latch.
#[derive(Debug)]
pub struct ContactTracker {
    config: SensorConfig,
    max_y: u16,
    slots: [SlotState; MAX_FINGERS],
    pool: RolePool,
    pressure_lock: bool,
    click_state: bool,
}

impl ContactTracker {
    pub fn new(config: SensorConfig, max_y: u16) -> ContactTracker {
        ContactTracker {
            config,
            max_y,
            slots: [SlotState::default(); MAX_FINGERS],
            pool: RolePool::new(),
            pressure_lock: false,
            click_state: false,
        }
    }

    /// Physical click/button state, fed by the host driver.
    pub fn set_click_state(&mut self, clicked: bool) {
        self.click_state = clicked;
    }

    pub fn is_latched(&self) -> bool {
        self.pressure_lock
    }

    /// Consume one decoded frame and emit the normalized contact frame.
    /// The report is zeroed afterwards so a smaller next frame cannot leak
    /// stale slots.
    pub fn process(&mut self, report: &mut FrameReport) -> ContactFrame {
        let fingers = report.fingers.min(MAX_FINGERS);
        let mut frame = ContactFrame {
            timestamp_us: report.timestamp_us,
            contact_count: fingers,
            contacts: [TrackedContact::default(); MAX_FINGERS],
        };

        // Validity first: palms are rejected before any latch or role work.
        let mut valid_count = 0usize;
        for i in 0..fingers {
            let obj = &report.objs[i];
            let mut valid = obj.state.is_contact();
            if valid && self.is_palm(obj.z, obj.wx, obj.wy) {
                log::debug!("slot {i} rejected as palm (z={} wx={} wy={})", obj.z, obj.wx, obj.wy);
                valid = false;
            }
            self.slots[i].valid = valid;
            frame.contacts[i].valid = valid;
            if valid {
                valid_count += 1;
            }
        }

        // The latch only survives while exactly one contact is down.
        if valid_count != 1 {
            self.pressure_lock = false;
        }

        for i in 0..fingers {
            if !self.slots[i].valid {
                continue;
            }
            let obj = &report.objs[i];

            // While latched the slot keeps its pre-latch coordinates.
            if !self.pressure_lock {
                self.slots[i].x = obj.x;
                self.slots[i].y = self.max_y.saturating_sub(obj.y);
            }

            if valid_count == 1
                && self.click_state
                && self.config.force_touch_emulation
                && obj.z > self.config.force_touch_min_pressure
            {
                self.pressure_lock = true;
            }

            let contact = &mut frame.contacts[i];
            contact.x = self.slots[i].x;
            contact.y = self.slots[i].y;
            contact.width = (f32::from(obj.z) / 1.5) as u16;
            contact.pressure = if self.pressure_lock { LATCHED_PRESSURE } else { 0 };
            contact.button_down = self.click_state && !self.pressure_lock;
        }

        if valid_count == 4 && self.pool.thumb_free {
            self.elect_thumb(fingers);
        }

        // Role pass runs only after the election settled.
        for i in 0..fingers {
            let slot = &mut self.slots[i];
            if slot.valid {
                if slot.finger_type == FingerType::Undefined {
                    slot.finger_type = self.pool.take_next();
                }
            } else {
                self.pool.release(slot.finger_type);
                slot.finger_type = FingerType::Undefined;
            }
            frame.contacts[i].finger_type = slot.finger_type;
        }

        report.clear();
        frame
    }

    fn is_palm(&self, z: u8, wx: u8, wy: u8) -> bool {
        z > self.config.palm_pressure_ceiling && wx.abs_diff(wy) < self.config.palm_width_delta
    }

    /// Assign the thumb role to the lowest contact on the pad (greatest
    /// output y), returning whatever role it held to the pool.
    fn elect_thumb(&mut self, fingers: usize) {
        let mut lowest: Option<usize> = None;
        let mut max_y = 0u16;
        for (i, slot) in self.slots[..fingers].iter().enumerate() {
            if slot.valid && slot.y > max_y {
                max_y = slot.y;
                lowest = Some(i);
            }
        }

        let Some(i) = lowest else {
            log::error!("no electable thumb among 4 contacts");
            return;
        };

        let slot = &mut self.slots[i];
        self.pool.release(slot.finger_type);
        slot.finger_type = FingerType::Thumb;
        self.pool.take_thumb();
    }
}
