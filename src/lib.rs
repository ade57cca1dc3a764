use std::{fs::File, io::Read, path::Path};

use error::{MojoError, MojoResult};
use interface::{DeviceInterface, SerialportParams, serialport::SerialPortDevice};
pub use protocols::Operation;
use protocols::mojo::{CancelToken, Mojo, Phase};
use tracing::info;
use util::{create_progress_bar, fraction_to_position};

pub(crate) mod constants;
pub mod error;
pub mod interface;
pub mod protocols;
pub(crate) mod util;

/// Where a bitstream should end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Configure the FPGA directly; lost on power cycle
    Ram,
    /// Store in flash, then load it into the FPGA
    Flash,
}

pub struct Programmer {
    mojo: Mojo<Box<dyn DeviceInterface>>,
    verify: bool,
    progress_bar_enable: bool,
}

impl Programmer {
    /// Open the serial port described by `params`
    pub fn new(params: SerialportParams) -> MojoResult<Self> {
        let device = SerialPortDevice::open(params)?;
        Ok(Self::from_interface(Box::new(device)))
    }

    pub fn from_interface(device: Box<dyn DeviceInterface>) -> Self {
        Programmer {
            mojo: Mojo::new(device),
            verify: true,
            progress_bar_enable: false,
        }
    }

    pub fn progress_bar(&mut self, enable: bool) {
        self.progress_bar_enable = enable;
    }

    /// Read flash back after programming it. Has no effect on RAM targets.
    pub fn verify_after_programming(&mut self, enable: bool) {
        self.verify = enable;
    }

    /// Token that stops the running operation at its next exchange
    pub fn cancel_token(&self) -> CancelToken {
        self.mojo.cancel_token()
    }

    pub fn phase(&self) -> Phase {
        self.mojo.phase()
    }

    pub fn erase(&mut self) -> MojoResult<()> {
        info!("Erasing flash");
        self.mojo.erase()
    }

    /// Program board with the raw bitstream at `file_path`
    pub fn program_file<P: AsRef<Path>>(&mut self, file_path: P, target: Target) -> MojoResult<()> {
        let file_path = file_path.as_ref();
        let mut file = File::open(file_path).map_err(|e| {
            MojoError::FirmwareError(format!("Failed to open {}: {}", file_path.display(), e))
        })?;
        let mut bin = Vec::new();
        file.read_to_end(&mut bin).map_err(|e| {
            MojoError::FirmwareError(format!("Could not read {}: {}", file_path.display(), e))
        })?;

        self.program_binary(&bin, target)
    }

    /// Program an in-memory bitstream
    pub fn program_binary(&mut self, bin: &[u8], target: Target) -> MojoResult<()> {
        let operation = match target {
            Target::Ram => Operation::ProgramRam,
            Target::Flash => Operation::ProgramFlash {
                verify: self.verify,
            },
        };
        self.run(operation, bin)
    }

    pub fn run(&mut self, operation: Operation, bin: &[u8]) -> MojoResult<()> {
        if !self.progress_bar_enable || operation == Operation::Erase {
            return self.mojo.run(operation, bin, None);
        }

        let total = bin.len() as u64;
        let pb = create_progress_bar(total, "Uploading bitstream")?;
        let mut report = |fraction: f64| pb.set_position(fraction_to_position(fraction, total));

        let result = self.mojo.run(operation, bin, Some(&mut report));
        match &result {
            Ok(()) => pb.finish_with_message("Done"),
            Err(_) => pb.abandon(),
        }
        result
    }
}
