use std::path::PathBuf;

use clap::{Args, Parser};
use mojoman::{Programmer, Target, error::MojoResult, interface::SerialportParams};

#[derive(Args, Debug, Clone)]
pub(crate) struct PortOptions {
    /// Serial port of the Mojo [default: /dev/mojo]
    #[clap(short, long)]
    device: Option<String>,

    /// Baud rate [default: 19200]
    #[clap(short, long)]
    baudrate: Option<u32>,

    /// Enable verbose output
    #[clap(short, long, default_value_t = false)]
    pub(crate) verbose: bool,
}

impl PortOptions {
    fn open(&self) -> MojoResult<Programmer> {
        Programmer::new(SerialportParams {
            port: self.device.clone(),
            baud: self.baudrate,
            timeout: None,
        })
    }
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct ProgramOptions {
    /// Bitstream file to upload
    bitstream: PathBuf,

    /// Install bitstream only to RAM
    #[clap(short, long, default_value_t = false)]
    ram: bool,

    /// Do not read flash back after writing it
    #[clap(short, long, default_value_t = false)]
    no_verify: bool,

    /// Display progress bar while uploading
    #[clap(short, long, default_value_t = false)]
    progress: bool,

    #[clap(flatten)]
    pub(crate) port: PortOptions,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct EraseOptions {
    #[clap(flatten)]
    pub(crate) port: PortOptions,
}

pub(crate) fn handle_programming(opts: ProgramOptions) -> MojoResult<()> {
    let mut programmer = opts.port.open()?;

    programmer.progress_bar(opts.progress);
    programmer.verify_after_programming(!opts.no_verify);

    let target = if opts.ram { Target::Ram } else { Target::Flash };
    programmer.program_file(&opts.bitstream, target)?;

    Ok(())
}

pub(crate) fn handle_erase(opts: EraseOptions) -> MojoResult<()> {
    let mut programmer = opts.port.open()?;
    programmer.erase()?;

    Ok(())
}
