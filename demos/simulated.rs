//! Run the full discovery and decode pipeline against a simulated F11
//! register space, no hardware required.
//!
//! Usage: cargo run --example simulated

use rmi_f11::{
    report, AbsObject, F11Addresses, FingerState, RegisterPort, SensorConfig, TouchSensor,
};

/// Flat in-memory register space standing in for the bus transport.
struct MemBus {
    mem: Vec<u8>,
}

impl RegisterPort for MemBus {
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) -> rmi_f11::Result<()> {
        let start = addr as usize;
        buf.copy_from_slice(&self.mem[start..start + buf.len()]);
        Ok(())
    }

    fn write_block(&mut self, addr: u16, data: &[u8]) -> rmi_f11::Result<()> {
        let start = addr as usize;
        self.mem[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

const ADDRS: F11Addresses = F11Addresses {
    query_base: 0x40,
    control_base: 0x20,
    data_base: 0x100,
};

/// A five-finger clickpad image: absolute reporting, physical size data,
/// palm detect, no optional extras beyond that.
fn clickpad_bus() -> MemBus {
    let mut mem = vec![0u8; 0x180];

    // Control block: dribble enabled at power-up, max coords 1215x680.
    mem[0x20] = 0x40;
    mem[0x26..0x28].copy_from_slice(&1215u16.to_le_bytes());
    mem[0x28..0x2a].copy_from_slice(&680u16.to_le_bytes());

    // Query region.
    mem[0x40] = 0x20; // presence header: query 12
    mem[0x41] = 0x34; // q1: code 4 (5 slots), abs + gestures
    mem[0x42] = 0x1e; // x electrodes
    mem[0x43] = 0x14; // y electrodes
    mem[0x44] = 0x1e; // max electrodes
    mem[0x45] = 0x10; // abs block: dribble
    mem[0x46] = 0x00; // q7
    mem[0x47] = 0x01; // q8: palm detect
    mem[0x48] = 0x20; // q12: physical props
    mem[0x49..0x4b].copy_from_slice(&1020u16.to_le_bytes()); // x size
    mem[0x4b..0x4d].copy_from_slice(&680u16.to_le_bytes()); // y size

    MemBus { mem }
}

fn contact(x: u16, y: u16, z: u8) -> AbsObject {
    AbsObject {
        state: FingerState::Present,
        x,
        y,
        z,
        wx: 3,
        wy: 8,
    }
}

fn main() {
    env_logger::init();

    let mut sensor = match TouchSensor::initialize(clickpad_bus(), ADDRS, SensorConfig::default())
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize sensor: {}", e);
            std::process::exit(1);
        }
    };

    let geometry = sensor.geometry();
    println!("Capabilities: {:#?}", sensor.capabilities());
    println!(
        "Geometry: {} slots, packet {} bytes, attention {} bytes",
        geometry.finger_count, geometry.packet_size, geometry.attention_size
    );
    println!("Axis maxima: {}x{}", sensor.max_x(), sensor.max_y());
    println!();

    // A finger drags across the pad while a second one taps.
    let frames: [&[AbsObject]; 4] = [
        &[contact(100, 600, 40)],
        &[contact(160, 560, 45), contact(800, 200, 35)],
        &[contact(220, 520, 45), contact(800, 200, 35)],
        &[contact(280, 480, 42)],
    ];

    for (i, objs) in frames.iter().enumerate() {
        let packet = report::pack_packet(&geometry, objs);
        let timestamp_us = 1_000_000 + i as u64 * 8_000;
        match sensor.on_attention(&packet, timestamp_us) {
            Some(frame) => {
                print!("t={}us ", frame.timestamp_us);
                for c in frame.contacts.iter().take(frame.contact_count) {
                    if c.valid {
                        print!("[{:?} ({}, {}) w={}] ", c.finger_type, c.x, c.y, c.width);
                    }
                }
                println!();
            }
            None => println!("t={}us suppressed", timestamp_us),
        }
    }

    // Keyboard activity suppresses the next frame.
    sensor.notify_keyboard_activity(2_000_000);
    let packet = report::pack_packet(&geometry, &[contact(500, 300, 40)]);
    assert!(sensor.on_attention(&packet, 2_100_000).is_none());
    println!("\nframe at t=2100000us suppressed by keyboard activity at t=2000000us");
}
