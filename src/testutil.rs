//! Test doubles shared across module tests.

use crate::port::RegisterPort;
use crate::sensor::F11Addresses;
use crate::{Result, RmiError};

/// In-memory register space over a contiguous address window.
#[derive(Debug)]
pub(crate) struct SimPort {
    base: u16,
    mem: Vec<u8>,
    fail_addr: Option<u16>,
}

impl SimPort {
    pub fn new(base: u16, bytes: &[u8]) -> SimPort {
        SimPort {
            base,
            mem: bytes.to_vec(),
            fail_addr: None,
        }
    }

    /// Fail any access whose range covers `addr`.
    pub fn fail_at(&mut self, addr: u16) {
        self.fail_addr = Some(addr);
    }

    fn range(&self, addr: u16, len: usize) -> Result<std::ops::Range<usize>> {
        if let Some(fail) = self.fail_addr {
            let span = u32::from(addr)..u32::from(addr) + len as u32;
            if span.contains(&u32::from(fail)) {
                return Err(RmiError::transport(fail, "simulated bus failure"));
            }
        }
        let start = addr
            .checked_sub(self.base)
            .ok_or_else(|| RmiError::transport(addr, "below register window"))?
            as usize;
        let end = start + len;
        if end > self.mem.len() {
            return Err(RmiError::transport(addr, "past register window"));
        }
        Ok(start..end)
    }
}

impl RegisterPort for SimPort {
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) -> Result<()> {
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.mem[range]);
        Ok(())
    }

    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        let range = self.range(addr, data.len())?;
        self.mem[range].copy_from_slice(data);
        Ok(())
    }
}

/// Register image of a typical clickpad query region: every optional block
/// present, finger-count code 5 (ten slots), ACM announced through the
/// chained query-28/36 reads.
pub(crate) fn clickpad_query_space() -> Vec<u8> {
    let mut q = Vec::new();
    q.push(0xf8); // header: queries 9, 11, 12, 27, 28
    q.push(0x3d); // q1: code 5 (10 slots), rel + abs + gestures
    q.push(0x1e); // x electrodes
    q.push(0x14); // y electrodes
    q.push(0x1e); // max electrodes
    q.push(0x90); // abs: dribble + jitter filter
    q.push(0x00); // rel query byte
    q.push(0x51); // q7: single tap, flick, pinch
    q.push(0x07); // q8: palm det, rotate, touch shapes
    q.push(0x01); // q9: pen
    q.push(0x04); // touch shapes: 4
    q.push(0x01); // q11: z tuning
    q.push(0x30); // q12: info2 + physical props
    q.push(0x55); // jitter: window 0x15, type 2
    q.push(0x0c); // info2: clear + clickpad
    q.extend_from_slice(&1020u16.to_le_bytes()); // x size, 0.1mm units
    q.extend_from_slice(&680u16.to_le_bytes()); // y size
    q.extend_from_slice(&[0u8; 8]); // bezel, skipped unread
    q.push(0x00); // query27 data, never read
    q.push(0x40); // query28: bit 6 announces query36
    q.push(0x00);
    q.push(0x20); // query36: bit 5 is the ACM flag
    q
}

/// A whole simulated F11 device: control block, query region and data
/// registers in one flat address space.
#[derive(Debug)]
pub(crate) struct SimDevice {
    port: SimPort,
}

impl SimDevice {
    pub const CONTROL_BASE: u16 = 0x20;
    pub const QUERY_BASE: u16 = 0x40;
    pub const DATA_BASE: u16 = 0x100;
    /// Query 12 lands 12 bytes into the query region of
    /// [`clickpad_query_space`].
    pub const QUERY12_ADDR: u16 = Self::QUERY_BASE + 12;

    pub const ADDRS: F11Addresses = F11Addresses {
        query_base: Self::QUERY_BASE,
        control_base: Self::CONTROL_BASE,
        data_base: Self::DATA_BASE,
    };

    pub fn regs(&self) -> &[u8] {
        &self.port.mem
    }

    pub fn regs_mut(&mut self) -> &mut [u8] {
        &mut self.port.mem
    }
}

impl RegisterPort for SimDevice {
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) -> Result<()> {
        self.port.read_block(addr, buf)
    }

    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.port.write_block(addr, data)
    }
}

pub(crate) fn sim_device() -> SimDevice {
    let mut mem = vec![0u8; 0x180];

    let ctrl = SimDevice::CONTROL_BASE as usize;
    mem[ctrl] = 0x40; // dribble enabled at power-up
    mem[ctrl + 11] = 0x01; // palm-detect interrupt enabled
    mem[ctrl + 6..ctrl + 8].copy_from_slice(&1215u16.to_le_bytes());
    mem[ctrl + 8..ctrl + 10].copy_from_slice(&680u16.to_le_bytes());

    let query = clickpad_query_space();
    let qbase = SimDevice::QUERY_BASE as usize;
    mem[qbase..qbase + query.len()].copy_from_slice(&query);

    SimDevice {
        port: SimPort::new(0, &mem),
    }
}
