//! Stream contact frames from a simulated sensor through the background
//! reader.
//!
//! Usage: cargo run --example stream

use rmi_f11::{
    report, AbsObject, Attention, AttentionSource, F11Addresses, FingerState, PacketGeometry,
    RegisterPort, SensorConfig, TouchSensor,
};
use std::time::Duration;

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

fn clickpad_bus() -> MemBus {
    let mut mem = vec![0u8; 0x180];
    mem[0x26..0x28].copy_from_slice(&1215u16.to_le_bytes());
    mem[0x28..0x2a].copy_from_slice(&680u16.to_le_bytes());
    mem[0x40] = 0x20; // presence header: query 12
    mem[0x41] = 0x34; // q1: code 4 (5 slots), abs + gestures
    mem[0x45] = 0x00; // abs block
    mem[0x47] = 0x01; // q8: palm detect
    mem[0x48] = 0x20; // q12: physical props
    mem[0x49..0x4b].copy_from_slice(&1020u16.to_le_bytes());
    mem[0x4b..0x4d].copy_from_slice(&680u16.to_le_bytes());
    MemBus { mem }
}

/// Replays a synthetic swipe at ~125 Hz, then goes quiet.
struct SwipeSource {
    geometry: PacketGeometry,
    step: u64,
}

impl AttentionSource for SwipeSource {
    fn wait_attention(&mut self, timeout: Duration) -> rmi_f11::Result<Option<Attention>> {
        if self.step >= 50 {
            std::thread::sleep(timeout);
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(8));
        self.step += 1;
        let obj = AbsObject {
            state: FingerState::Present,
            x: (100 + self.step * 20) as u16,
            y: 400,
            z: 35,
            wx: 3,
            wy: 7,
        };
        Ok(Some(Attention {
            packet: report::pack_packet(&self.geometry, &[obj]),
            timestamp_us: 1_000_000 + self.step * 8_000,
        }))
    }
}

fn main() {
    env_logger::init();

    let sensor = match TouchSensor::initialize(clickpad_bus(), ADDRS, SensorConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize sensor: {}", e);
            std::process::exit(1);
        }
    };

    let source = SwipeSource {
        geometry: sensor.geometry(),
        step: 0,
    };

    let stream = match rmi_f11::ContactStream::start(sensor, source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start stream: {}", e);
            std::process::exit(1);
        }
    };

    println!("Streaming contact frames...");

    let mut count = 0u64;
    loop {
        match stream.recv_timeout(Duration::from_millis(500)) {
            Ok(frame) => {
                count += 1;
                if count % 10 == 1 {
                    let c = &frame.contacts[0];
                    println!(
                        "t={:<8} {:?} at ({}, {})",
                        frame.timestamp_us, c.finger_type, c.x, c.y
                    );
                }
            }
            Err(rmi_f11::RmiError::Timeout) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    println!("Total: {} frames", count);
    stream.stop();
}
