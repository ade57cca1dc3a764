use tracing::{debug, trace};

use super::{DeviceInterface, SerialportParams};
use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PORT, SERIAL_TIMEOUT};

use crate::error::{MojoError, MojoResult};
use std::io::{ErrorKind, Read, Write};

pub type ComPort = String;
pub type BaudRate = u32;
/// Serial port device_interface layer
pub(crate) struct SerialPortDevice {
    pub serial_port: Box<dyn serialport::SerialPort>,
}

impl SerialPortDevice {
    pub fn open(params: SerialportParams) -> MojoResult<SerialPortDevice> {
        let port: ComPort = params
            .port
            .unwrap_or_else(|| DEFAULT_SERIAL_PORT.to_owned());
        let baud: BaudRate = params.baud.unwrap_or(DEFAULT_BAUD_RATE);
        let timeout = params.timeout.unwrap_or(SERIAL_TIMEOUT);

        let serial_port = serialport::new(&port, baud)
            .timeout(timeout)
            .dtr_on_open(false)
            .open()
            .map_err(|e| MojoError::TransportUnavailable {
                port: port.clone(),
                reason: e.to_string(),
            })?;

        debug!("Opened {} at {} baud", port, baud);
        Ok(SerialPortDevice { serial_port })
    }
}

impl DeviceInterface for SerialPortDevice {
    fn send(&mut self, bytes: &[u8]) -> MojoResult<()> {
        self.serial_port
            .write_all(bytes)
            .and_then(|_| self.serial_port.flush())
            .map_err(|e| MojoError::Communication(format!("{:?}", e)))?;
        trace!("Sent {} bytes", bytes.len());
        Ok(())
    }

    fn receive(&mut self, expected_bytes: usize) -> MojoResult<Vec<u8>> {
        let mut buffer = vec![0; expected_bytes];
        let mut received = 0;

        // Block and keep reading until we have the expected number of bytes
        while received < expected_bytes {
            match self.serial_port.read(&mut buffer[received..]) {
                Ok(0) => {
                    return Err(MojoError::Timeout {
                        expected: expected_bytes,
                        received,
                    });
                }
                Ok(n) => received += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    return Err(MojoError::Timeout {
                        expected: expected_bytes,
                        received,
                    });
                }
                Err(e) => return Err(MojoError::Communication(format!("{:?}", e))),
            }
        }

        trace!("Received bytes {:02X?}", &buffer[..received.min(16)]);
        Ok(buffer)
    }

    fn set_reset(&mut self, asserted: bool) -> MojoResult<()> {
        self.serial_port
            .write_data_terminal_ready(asserted)
            .map_err(|e| {
                MojoError::Communication(format!("Failed to set DTR {}: {:?}", asserted, e))
            })
    }
}
