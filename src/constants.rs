use std::time::Duration;

pub(crate) const DEFAULT_SERIAL_PORT: &str = "/dev/mojo";
pub(crate) const DEFAULT_BAUD_RATE: u32 = 19200;
pub(crate) const SERIAL_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const REBOOT_SETTLE_DELAY: Duration = Duration::from_millis(5);
pub(crate) const REBOOT_TOGGLE_DELAY: Duration = Duration::from_millis(5);
pub(crate) const REBOOT_TOGGLE_CYCLES: usize = 5;

/// Extra bytes the board adds to the length it reports in a flash dump
pub(crate) const VERIFY_LENGTH_OVERHEAD: u32 = 5;

pub(crate) const LENGTH_FRAME_SIZE: usize = 4;
pub(crate) const PAYLOAD_CHUNK_SIZE: usize = 256;
