//! Control register access.
//!
//! One-time setup at attach: the control block is read, the dribble and
//! palm-detect interrupt bits are masked off for devices that have those
//! features, and the block is written back. The block also carries the
//! sensor's coordinate maxima, which the tracker needs for its y inversion.

use crate::port::RegisterPort;
use crate::types::SensorCapabilities;
use crate::Result;

/// Size of the ctrl0..ctrl11 register block.
pub const CTRL_REG_COUNT: usize = 12;

const CTRL_MAX_X_POS_OFFSET: u16 = 6;
const CTRL_MAX_Y_POS_OFFSET: u16 = 8;

/// Dribble reporting enable, ctrl0 bit 6.
const CTRL0_DRIBBLE: u8 = 1 << 6;
/// Palm-detect interrupt enable, ctrl11 bit 0.
const CTRL11_PALM_DETECT: u8 = 1 << 0;

/// Maximum reportable coordinates, read from the control block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMaxima {
    pub max_x: u16,
    pub max_y: u16,
}

/// Read the sensor's coordinate maxima.
pub fn read_axis_maxima<P: RegisterPort>(port: &mut P, control_base: u16) -> Result<AxisMaxima> {
    let mut buf = [0u8; 2];
    port.read_block(control_base + CTRL_MAX_X_POS_OFFSET, &mut buf)?;
    let max_x = u16::from_le_bytes(buf);
    port.read_block(control_base + CTRL_MAX_Y_POS_OFFSET, &mut buf)?;
    let max_y = u16::from_le_bytes(buf);
    Ok(AxisMaxima { max_x, max_y })
}

/// Read the control block, suppress dribble and palm-detect reporting where
/// the device supports them, and write the block back.
pub fn sync_control_regs<P: RegisterPort>(
    port: &mut P,
    control_base: u16,
    caps: &SensorCapabilities,
) -> Result<()> {
    let mut ctrl = [0u8; CTRL_REG_COUNT];
    port.read_block(control_base, &mut ctrl)?;

    if caps.has_dribble {
        ctrl[0] &= !CTRL0_DRIBBLE;
    }
    if caps.has_palm_det {
        ctrl[11] &= !CTRL11_PALM_DETECT;
    }

    port.write_block(control_base, &ctrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SimPort;

    #[test]
    fn maxima_are_little_endian() {
        let mut regs = vec![0u8; CTRL_REG_COUNT];
        regs[6..8].copy_from_slice(&1215u16.to_le_bytes());
        regs[8..10].copy_from_slice(&680u16.to_le_bytes());
        let mut port = SimPort::new(0x20, &regs);

        let maxima = read_axis_maxima(&mut port, 0x20).unwrap();
        assert_eq!(maxima.max_x, 1215);
        assert_eq!(maxima.max_y, 680);
    }

    #[test]
    fn sync_clears_dribble_and_palm_bits() {
        let mut regs = [0xffu8; CTRL_REG_COUNT];
        let mut port = SimPort::new(0x20, &regs);

        let caps = SensorCapabilities {
            has_dribble: true,
            has_palm_det: true,
            ..SensorCapabilities::default()
        };
        sync_control_regs(&mut port, 0x20, &caps).unwrap();

        port.read_block(0x20, &mut regs).unwrap();
        assert_eq!(regs[0], 0xff & !CTRL0_DRIBBLE);
        assert_eq!(regs[11], 0xff & !CTRL11_PALM_DETECT);
        for reg in &regs[1..11] {
            assert_eq!(*reg, 0xff);
        }
    }

    #[test]
    fn sync_leaves_bits_alone_without_features() {
        let mut regs = [0xffu8; CTRL_REG_COUNT];
        let mut port = SimPort::new(0x20, &regs);

        sync_control_regs(&mut port, 0x20, &SensorCapabilities::default()).unwrap();

        port.read_block(0x20, &mut regs).unwrap();
        assert_eq!(regs, [0xffu8; CTRL_REG_COUNT]);
    }
}
