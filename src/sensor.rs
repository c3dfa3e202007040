//! F11 device session.
//!
//! Ties the discovery walk, geometry derivation and control sync into a
//! one-time initialization, then decodes attention reports into contact
//! frames. Discovery must complete before any frame decoding is valid;
//! initialization failure is terminal and no partial capability set is
//! ever used.

use crate::control::{self, AxisMaxima};
use crate::port::RegisterPort;
use crate::query;
use crate::report;
use crate::tracker::ContactTracker;
use crate::types::{ContactFrame, FrameReport, PacketGeometry, SensorCapabilities, SensorConfig};
use crate::{Result, RmiError};

/// Function register bases from the device's descriptor table.
#[derive(Debug, Clone, Copy)]
pub struct F11Addresses {
    pub query_base: u16,
    pub control_base: u16,
    pub data_base: u16,
}

/// An initialized 2D sensor session.
///
/// Owns the register port, the reused report buffer and the contact
/// tracker. Attention events are fed serially; nothing here blocks.
#[derive(Debug)]
pub struct TouchSensor<P: RegisterPort> {
    port: P,
    addrs: F11Addresses,
    config: SensorConfig,
    capabilities: SensorCapabilities,
    geometry: PacketGeometry,
    maxima: AxisMaxima,
    /// Bytes the query region occupied, header included.
    query_bytes: u16,
    tracker: ContactTracker,
    report: FrameReport,
    packet_buf: Vec<u8>,
    touchpad_enabled: bool,
    last_keyboard_ts_us: u64,
}

impl<P: RegisterPort> TouchSensor<P> {
    /// Discover the sensor behind `port` and bring it up: capability walk,
    /// mandatory-capability checks, geometry derivation and control sync.
    pub fn initialize(mut port: P, addrs: F11Addresses, config: SensorConfig) -> Result<Self> {
        let (capabilities, geometry, maxima, query_bytes) =
            discover_and_sync(&mut port, &addrs)?;

        let tracker = ContactTracker::new(config, maxima.max_y);
        let packet_buf = vec![0u8; geometry.packet_size];

        Ok(TouchSensor {
            port,
            addrs,
            config,
            capabilities,
            geometry,
            maxima,
            query_bytes,
            tracker,
            report: FrameReport::default(),
            packet_buf,
            touchpad_enabled: true,
            last_keyboard_ts_us: 0,
        })
    }

    /// Re-run discovery after a device reset. The capability walk is the
    /// only state that survives a reset; tracker state starts over.
    pub fn rediscover(&mut self) -> Result<()> {
        let (capabilities, geometry, maxima, query_bytes) =
            discover_and_sync(&mut self.port, &self.addrs)?;

        self.capabilities = capabilities;
        self.geometry = geometry;
        self.maxima = maxima;
        self.query_bytes = query_bytes;
        self.tracker = ContactTracker::new(self.config, maxima.max_y);
        self.packet_buf = vec![0u8; geometry.packet_size];
        self.report.clear();
        Ok(())
    }

    /// Handle one attention event from raw packet bytes.
    ///
    /// Returns `None` when the frame is suppressed: touch input disabled,
    /// or the timestamp falls inside the typing-guard window. Suppression
    /// is checked before any per-slot work so a dropped frame never
    /// touches tracker state.
    pub fn on_attention(&mut self, packet: &[u8], timestamp_us: u64) -> Option<ContactFrame> {
        if self.should_discard(timestamp_us) {
            return None;
        }

        report::decode_into(&self.geometry, packet, timestamp_us, &mut self.report);
        Some(self.tracker.process(&mut self.report))
    }

    /// Read the report packet from the data registers and handle it. The
    /// transport's attention signal tells the host *that* a report is
    /// ready; this is the read-and-decode half.
    pub fn read_attention(&mut self, timestamp_us: u64) -> Result<Option<ContactFrame>> {
        let mut packet = std::mem::take(&mut self.packet_buf);
        let frame = self
            .port
            .read_block(self.addrs.data_base, &mut packet)
            .map(|()| self.on_attention(&packet, timestamp_us));
        self.packet_buf = packet;
        frame
    }

    pub fn set_click_state(&mut self, clicked: bool) {
        self.tracker.set_click_state(clicked);
    }

    pub fn set_touchpad_enabled(&mut self, enabled: bool) {
        self.touchpad_enabled = enabled;
    }

    /// Record keyboard (or trackpoint) activity; frames inside the guard
    /// window after this timestamp are discarded.
    pub fn notify_keyboard_activity(&mut self, timestamp_us: u64) {
        self.last_keyboard_ts_us = timestamp_us;
    }

    pub fn capabilities(&self) -> &SensorCapabilities {
        &self.capabilities
    }

    pub fn geometry(&self) -> PacketGeometry {
        self.geometry
    }

    pub fn max_x(&self) -> u16 {
        self.maxima.max_x
    }

    pub fn max_y(&self) -> u16 {
        self.maxima.max_y
    }

    /// Query-region length in bytes, presence header included. Callers
    /// reading registers past the query region position off this.
    pub fn query_region_len(&self) -> u16 {
        self.query_bytes
    }

    fn should_discard(&self, timestamp_us: u64) -> bool {
        !self.touchpad_enabled
            || timestamp_us.wrapping_sub(self.last_keyboard_ts_us) < self.config.typing_guard_us
    }
}

/// The one-time bring-up sequence shared by initialize and rediscover.
fn discover_and_sync<P: RegisterPort>(
    port: &mut P,
    addrs: &F11Addresses,
) -> Result<(SensorCapabilities, PacketGeometry, AxisMaxima, u16)> {
    let (capabilities, query_bytes) = query::discover(port, addrs.query_base)?;

    if !capabilities.has_physical_props {
        return Err(RmiError::UnsupportedDevice("no physical size data"));
    }
    if !capabilities.has_abs {
        return Err(RmiError::UnsupportedDevice("no absolute reporting support"));
    }

    let maxima = control::read_axis_maxima(port, addrs.control_base)?;
    let geometry = crate::geometry::packet_geometry(&capabilities);

    control::sync_control_regs(port, addrs.control_base, &capabilities)?;

    log::info!(
        "F11 sensor up: {} fingers, packet {} bytes (attn {}), {}x{} ({}mm x {}mm)",
        geometry.finger_count,
        geometry.packet_size,
        geometry.attention_size,
        maxima.max_x,
        maxima.max_y,
        capabilities.x_sensor_size_mm,
        capabilities.y_sensor_size_mm,
    );

    Ok((capabilities, geometry, maxima, query_bytes))
}
