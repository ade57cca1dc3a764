use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{debug, info, trace};

use super::Operation;
use crate::constants::{
    LENGTH_FRAME_SIZE, PAYLOAD_CHUNK_SIZE, REBOOT_SETTLE_DELAY, REBOOT_TOGGLE_CYCLES,
    REBOOT_TOGGLE_DELAY, VERIFY_LENGTH_OVERHEAD,
};
use crate::error::{MojoError, MojoResult};
use crate::interface::DeviceInterface;

/// Single-byte commands understood by the Mojo bootloader
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MojoCommand {
    ProgramRam = b'R',
    ProgramFlash = b'F',
    ProgramFlashVerify = b'V',
    ReadFlash = b'S',
    LoadFlash = b'L',
    EraseFlash = b'E',
}

/// Single-byte markers the bootloader answers with
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MojoResponse {
    Ready = b'R',
    SizeOk = b'O',
    Done = b'D',
    FlashDumpStart = 0xAA,
}

/// Every single-byte gate of the protocol. Each step knows the byte the
/// board must answer with and which error a different answer maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Erase,
    ModeSelect,
    SizeAck,
    DataAck,
    VerifyStart,
    Load,
}

impl Step {
    pub fn expected(self) -> u8 {
        let response = match self {
            Step::Erase | Step::DataAck | Step::Load => MojoResponse::Done,
            Step::ModeSelect => MojoResponse::Ready,
            Step::SizeAck => MojoResponse::SizeOk,
            Step::VerifyStart => MojoResponse::FlashDumpStart,
        };
        response as u8
    }

    fn failure(self, actual: u8) -> MojoError {
        let expected = self.expected();
        match self {
            Step::Erase => MojoError::EraseFailed { expected, actual },
            Step::ModeSelect => MojoError::ModeNotAcknowledged { expected, actual },
            Step::SizeAck => MojoError::SizeNotAcknowledged { expected, actual },
            Step::DataAck => MojoError::WriteFailed { expected, actual },
            Step::VerifyStart => MojoError::VerifyStartInvalid { expected, actual },
            Step::Load => MojoError::LoadFailed { expected, actual },
        }
    }
}

/// Where the engine is in the current operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rebooted,
    ModeSelected,
    SizeAcked,
    PayloadSent,
    DataAck,
    Verified,
    Loaded,
    Erased,
    Failed,
}

/// Shared flag to stop an operation at the next exchange boundary
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub type ProgressCallback<'a> = &'a mut dyn FnMut(f64);

/// Encode a payload length as the 4 byte little endian frame
pub fn encode_length(length: u32) -> [u8; LENGTH_FRAME_SIZE] {
    length.to_le_bytes()
}

pub fn decode_length(frame: [u8; LENGTH_FRAME_SIZE]) -> u32 {
    u32::from_le_bytes(frame)
}

/// Protocol engine for the Mojo bootloader. Owns the device for as long
/// as it lives, so two operations can never interleave on one port.
pub struct Mojo<D: DeviceInterface> {
    device: D,
    phase: Phase,
    cancel: CancelToken,
}

impl<D: DeviceInterface> Mojo<D> {
    pub fn new(device: D) -> Self {
        Mojo {
            device,
            phase: Phase::Idle,
            cancel: CancelToken::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Toggle the reset line so the bootloader starts listening for a
    /// command. Leaves the line asserted.
    pub fn reboot(&mut self) -> MojoResult<()> {
        self.device.set_reset(true)?;
        thread::sleep(REBOOT_SETTLE_DELAY);

        for _ in 0..REBOOT_TOGGLE_CYCLES {
            self.device.set_reset(false)?;
            thread::sleep(REBOOT_TOGGLE_DELAY);
            self.device.set_reset(true)?;
            thread::sleep(REBOOT_TOGGLE_DELAY);
        }

        debug!("Rebooting Mojo");
        self.advance(Phase::Rebooted);
        Ok(())
    }

    /// Run one operation from a fresh reboot. `bitstream` is ignored for
    /// [`Operation::Erase`].
    pub fn run(
        &mut self,
        operation: Operation,
        bitstream: &[u8],
        progress: Option<ProgressCallback>,
    ) -> MojoResult<()> {
        self.phase = Phase::Idle;

        let result = self.checkpoint().and_then(|_| match operation.mode_select() {
            None => self.erase_inner(),
            Some(mode) => self.program_inner(operation, mode, bitstream, progress),
        });
        self.cancel.reset();

        if let Err(e) = &result {
            debug!("{:?} failed in phase {:?}: {}", operation, self.phase, e);
            self.advance(Phase::Failed);
        }
        result
    }

    pub fn erase(&mut self) -> MojoResult<()> {
        self.run(Operation::Erase, &[], None)
    }

    fn erase_inner(&mut self) -> MojoResult<()> {
        self.reboot()?;
        self.exchange(MojoCommand::EraseFlash, Step::Erase)?;
        info!("Erased Mojo successfully");
        self.advance(Phase::Erased);
        Ok(())
    }

    fn program_inner(
        &mut self,
        operation: Operation,
        mode: MojoCommand,
        bitstream: &[u8],
        progress: Option<ProgressCallback>,
    ) -> MojoResult<()> {
        let length = u32::try_from(bitstream.len())
            .map_err(|_| MojoError::BitstreamTooLarge(bitstream.len()))?;

        self.reboot()?;

        self.exchange(mode, Step::ModeSelect)?;
        debug!("Mojo is ready to receive bitstream ({})", mode as u8 as char);
        self.advance(Phase::ModeSelected);

        self.checkpoint()?;
        trace!("Size of payload is {}", length);
        self.device.send(&encode_length(length))?;
        self.expect(Step::SizeAck)?;
        debug!("Mojo acknowledged size of bitstream. Writing bitstream");
        self.advance(Phase::SizeAcked);

        self.checkpoint()?;
        self.send_payload(bitstream, progress)?;
        self.advance(Phase::PayloadSent);

        self.expect(Step::DataAck)?;
        debug!("Mojo has been flashed");
        self.advance(Phase::DataAck);

        if operation.verifies() {
            self.verify(bitstream, length)?;
            self.advance(Phase::Verified);
        }

        if operation.loads_from_flash() {
            self.exchange(MojoCommand::LoadFlash, Step::Load)?;
            debug!("Mojo has loaded bitstream");
        }

        info!("Programmed {} bytes", length);
        self.advance(Phase::Loaded);
        Ok(())
    }

    /// The payload is one logical frame; chunking only exists so progress
    /// can be reported.
    fn send_payload(
        &mut self,
        bitstream: &[u8],
        mut progress: Option<ProgressCallback>,
    ) -> MojoResult<()> {
        let total = bitstream.len();
        if total == 0 {
            if let Some(report) = progress.as_mut() {
                report(1.0);
            }
            return Ok(());
        }

        let mut sent = 0;
        for chunk in bitstream.chunks(PAYLOAD_CHUNK_SIZE) {
            self.device.send(chunk)?;
            sent += chunk.len();
            if let Some(report) = progress.as_mut() {
                report((sent as f64 / total as f64).clamp(0.0, 1.0));
            }
        }

        Ok(())
    }

    fn verify(&mut self, bitstream: &[u8], length: u32) -> MojoResult<()> {
        debug!("Verifying Mojo");
        self.exchange(MojoCommand::ReadFlash, Step::VerifyStart)?;
        debug!("First byte was valid, getting flash size");

        let frame = self.device.receive(LENGTH_FRAME_SIZE)?;
        let frame: [u8; LENGTH_FRAME_SIZE] = frame.as_slice().try_into().map_err(|_| {
            MojoError::Timeout {
                expected: LENGTH_FRAME_SIZE,
                received: frame.len(),
            }
        })?;
        let reported = decode_length(frame);
        if reported.checked_sub(VERIFY_LENGTH_OVERHEAD) != Some(length) {
            return Err(MojoError::VerifySizeMismatch {
                expected: length,
                reported,
            });
        }
        debug!("Flash and local bitstream match file size");

        let flash = self.device.receive(bitstream.len())?;
        if let Some((offset, (&expected, &actual))) = bitstream
            .iter()
            .zip(flash.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(MojoError::VerifyContentMismatch {
                offset,
                expected,
                actual,
            });
        }
        if flash.len() != bitstream.len() {
            return Err(MojoError::Timeout {
                expected: bitstream.len(),
                received: flash.len(),
            });
        }

        debug!("Flash and local bitstream are a match");
        Ok(())
    }

    fn exchange(&mut self, command: MojoCommand, step: Step) -> MojoResult<()> {
        self.checkpoint()?;
        self.device.send(&[command as u8])?;
        self.expect(step)
    }

    fn expect(&mut self, step: Step) -> MojoResult<()> {
        let response = self.device.receive(1)?;
        let actual = *response.first().ok_or(MojoError::Timeout {
            expected: 1,
            received: 0,
        })?;
        trace!("{:?}: received 0x{:02X}", step, actual);

        if actual == step.expected() {
            Ok(())
        } else {
            Err(step.failure(actual))
        }
    }

    fn checkpoint(&self) -> MojoResult<()> {
        if self.cancel.is_cancelled() {
            return Err(MojoError::Cancelled);
        }
        Ok(())
    }

    fn advance(&mut self, phase: Phase) {
        trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
