use crate::Result;

/// Byte-addressed synchronous access to the device's register space.
///
/// The bus transport (SMBus, SPI, I2C...) lives behind this trait; retry and
/// timeout policy belong to the implementor. Errors surface verbatim as
/// [`RmiError::Transport`](crate::RmiError::Transport) and abort whatever
/// operation was in flight.
pub trait RegisterPort {
    /// Read `buf.len()` bytes starting at `addr`.
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `addr`.
    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()>;

    /// Read a single byte at `addr`.
    fn read(&mut self, addr: u16) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_block(addr, &mut buf)?;
        Ok(buf[0])
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for &mut P {
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) -> Result<()> {
        (**self).read_block(addr, buf)
    }

    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        (**self).write_block(addr, data)
    }

    fn read(&mut self, addr: u16) -> Result<u8> {
        (**self).read(addr)
    }
}
