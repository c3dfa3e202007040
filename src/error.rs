/// Errors that can occur while talking to an F11 sensor.
#[derive(Debug, thiserror::Error)]
pub enum RmiError {
    /// A register read or write failed at the transport layer. Fatal to
    /// initialization: the capability walk aborts and discards any
    /// partially-populated state.
    #[error("register transport error at 0x{addr:04x}: {reason}")]
    Transport { addr: u16, reason: String },

    /// The device lacks a capability this driver cannot work without
    /// (absolute reporting, physical size data).
    #[error("unsupported device: {0}")]
    UnsupportedDevice(&'static str),

    #[error("contact stream stopped")]
    StreamStopped,

    #[error("timeout waiting for data")]
    Timeout,
}

impl RmiError {
    /// Convenience constructor for port implementations.
    pub fn transport(addr: u16, reason: impl Into<String>) -> Self {
        RmiError::Transport {
            addr,
            reason: reason.into(),
        }
    }
}
