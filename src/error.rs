use thiserror::Error;

#[derive(Error, Debug)]
pub enum MojoError {
    #[error("No serial port found named {port}: {reason}")]
    TransportUnavailable { port: String, reason: String },

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Timed out waiting for {expected} byte(s), received {received}")]
    Timeout { expected: usize, received: usize },

    #[error(
        "Mojo did not respond correctly to mode select (expected {}, got {}). Make sure the port is correct",
        show_byte(.expected),
        show_byte(.actual)
    )]
    ModeNotAcknowledged { expected: u8, actual: u8 },

    #[error(
        "Mojo failed to acknowledge size of bitstream (expected {}, got {})",
        show_byte(.expected),
        show_byte(.actual)
    )]
    SizeNotAcknowledged { expected: u8, actual: u8 },

    #[error(
        "Mojo failed to flash correctly (expected {}, got {})",
        show_byte(.expected),
        show_byte(.actual)
    )]
    WriteFailed { expected: u8, actual: u8 },

    #[error(
        "Mojo failed to load bitstream (expected {}, got {})",
        show_byte(.expected),
        show_byte(.actual)
    )]
    LoadFailed { expected: u8, actual: u8 },

    #[error(
        "Failed to erase Mojo (expected {}, got {})",
        show_byte(.expected),
        show_byte(.actual)
    )]
    EraseFailed { expected: u8, actual: u8 },

    #[error(
        "Flash does not contain valid start byte (expected {}, got {})",
        show_byte(.expected),
        show_byte(.actual)
    )]
    VerifyStartInvalid { expected: u8, actual: u8 },

    #[error(
        "Flash is not same size as local bitstream: flash reported {reported} bytes, expected {expected} plus overhead"
    )]
    VerifySizeMismatch { expected: u32, reported: u32 },

    #[error(
        "Flash and local bitstream do not match at offset {offset}: expected 0x{expected:02X}, got 0x{actual:02X}"
    )]
    VerifyContentMismatch {
        offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("Firmware error: {0}")]
    FirmwareError(String),

    #[error("Bitstream of {0} bytes does not fit in a 32-bit length frame")]
    BitstreamTooLarge(usize),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type MojoResult<T> = std::result::Result<T, MojoError>;

fn show_byte(byte: &u8) -> String {
    let byte = *byte;
    if byte.is_ascii_graphic() {
        format!("'{}' (0x{:02X})", byte as char, byte)
    } else {
        format!("0x{:02X}", byte)
    }
}
