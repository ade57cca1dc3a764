pub mod serialport;

use std::time::Duration;

use crate::error::MojoResult;

/// Byte-oriented duplex channel to the board, plus the reset line.
///
/// Only one operation may drive a device at a time; the engine takes
/// ownership of it for that reason.
pub trait DeviceInterface {
    /// Send bytes to the board, in order
    fn send(&mut self, bytes: &[u8]) -> MojoResult<()>;

    /// Block until exactly `expected_bytes` bytes have arrived or the read
    /// times out
    fn receive(&mut self, expected_bytes: usize) -> MojoResult<Vec<u8>>;

    /// Drive the reset control line
    fn set_reset(&mut self, asserted: bool) -> MojoResult<()>;
}

impl<D: DeviceInterface + ?Sized> DeviceInterface for Box<D> {
    fn send(&mut self, bytes: &[u8]) -> MojoResult<()> {
        (**self).send(bytes)
    }

    fn receive(&mut self, expected_bytes: usize) -> MojoResult<Vec<u8>> {
        (**self).receive(expected_bytes)
    }

    fn set_reset(&mut self, asserted: bool) -> MojoResult<()> {
        (**self).set_reset(asserted)
    }
}

/// Serial port settings. Anything left as `None` falls back to what the
/// Mojo bootloader expects.
#[derive(Debug, Clone, Default)]
pub struct SerialportParams {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub timeout: Option<Duration>,
}
