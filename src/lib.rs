//! # rmi-f11 - decoder for the Synaptics RMI4 F11 2D sensor function
//!
//! Turns raw, variably-shaped F11 report packets into a normalized
//! multitouch contact stream. Provides:
//! - The capability-query walk that discovers a device's packet geometry
//!   at runtime from its chain of conditionally-present query registers
//! - Bit-exact decoding of packed finger reports into typed contacts
//! - Contact tracking with stable finger roles, force-touch pressure
//!   latching and type-while-disabled suppression
//!
//! The bus transport is not implemented here; callers supply a
//! [`RegisterPort`] over their SMBus/SPI/I2C plumbing.
//!
//! ## Quick Start
//! ```no_run
//! use rmi_f11::{F11Addresses, SensorConfig, TouchSensor};
//!
//! struct MyBus;
//! impl rmi_f11::RegisterPort for MyBus {
//!     fn read_block(&mut self, _addr: u16, _buf: &mut [u8]) -> rmi_f11::Result<()> {
//!         todo!("bus-specific read")
//!     }
//!     fn write_block(&mut self, _addr: u16, _data: &[u8]) -> rmi_f11::Result<()> {
//!         todo!("bus-specific write")
//!     }
//! }
//!
//! let addrs = F11Addresses { query_base: 0x49, control_base: 0x1b, data_base: 0x06 };
//! let mut sensor = TouchSensor::initialize(MyBus, addrs, SensorConfig::default()).unwrap();
//!
//! // Per attention event:
//! if let Some(frame) = sensor.read_attention(0).unwrap() {
//!     for contact in frame.contacts.iter().filter(|c| c.valid) {
//!         println!("{:?} at ({}, {})", contact.finger_type, contact.x, contact.y);
//!     }
//! }
//! ```

pub mod control;
pub mod error;
pub mod geometry;
pub mod port;
pub mod query;
pub mod report;
pub mod sensor;
pub mod stream;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::RmiError;
pub use port::RegisterPort;
pub use sensor::{F11Addresses, TouchSensor};
pub use stream::{Attention, AttentionSource, ContactStream};
pub use tracker::ContactTracker;
pub use types::*;

/// Result type alias for rmi-f11 operations.
pub type Result<T> = std::result::Result<T, RmiError>;
