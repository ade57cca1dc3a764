use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use mojoman::error::{MojoError, MojoResult};
use mojoman::interface::DeviceInterface;

enum Parser {
    /// Waiting for the reset line to be toggled
    Offline,
    Command,
    Length { mode: u8, frame: Vec<u8> },
    Payload { mode: u8, length: usize, data: Vec<u8> },
}

/// What the simulated board holds, shared with the test body
#[derive(Default)]
pub struct BoardState {
    pub ram: Option<Vec<u8>>,
    pub flash: Option<Vec<u8>>,
    pub commands: Vec<u8>,
    pub reboots: usize,
    /// Flip a bit at this offset when storing to flash
    pub corrupt_flash_at: Option<usize>,
    /// Answer mode select with this byte instead of 'R'
    pub mode_reply: Option<u8>,
}

/// Behaves like the Mojo bootloader's command parser
pub struct SimulatedBoard {
    state: Rc<RefCell<BoardState>>,
    parser: Parser,
    outbox: VecDeque<u8>,
    reset_line: bool,
    pulses: usize,
}

impl SimulatedBoard {
    pub fn new() -> (Self, Rc<RefCell<BoardState>>) {
        let state = Rc::new(RefCell::new(BoardState::default()));
        let board = SimulatedBoard {
            state: Rc::clone(&state),
            parser: Parser::Offline,
            outbox: VecDeque::new(),
            reset_line: false,
            pulses: 0,
        };
        (board, state)
    }

    fn feed(&mut self, byte: u8) {
        let mut state = self.state.borrow_mut();
        self.parser = match std::mem::replace(&mut self.parser, Parser::Offline) {
            Parser::Offline => Parser::Offline,
            Parser::Command => {
                state.commands.push(byte);
                match byte {
                    b'E' => {
                        state.flash = None;
                        self.outbox.push_back(b'D');
                        Parser::Command
                    }
                    b'R' | b'F' | b'V' => {
                        self.outbox.push_back(state.mode_reply.unwrap_or(b'R'));
                        Parser::Length {
                            mode: byte,
                            frame: Vec::new(),
                        }
                    }
                    b'S' => {
                        let flash = state.flash.clone().unwrap_or_default();
                        self.outbox.push_back(0xAA);
                        self.outbox
                            .extend((flash.len() as u32 + 5).to_le_bytes());
                        self.outbox.extend(flash);
                        Parser::Command
                    }
                    b'L' => {
                        state.ram = state.flash.clone();
                        self.outbox.push_back(b'D');
                        Parser::Command
                    }
                    _ => Parser::Command,
                }
            }
            Parser::Length { mode, mut frame } => {
                frame.push(byte);
                if frame.len() < 4 {
                    Parser::Length { mode, frame }
                } else {
                    let length = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
                    self.outbox.push_back(b'O');
                    let parser = Parser::Payload {
                        mode,
                        length: length as usize,
                        data: Vec::new(),
                    };
                    if length == 0 {
                        Self::store(&mut state, &mut self.outbox, mode, Vec::new())
                    } else {
                        parser
                    }
                }
            }
            Parser::Payload {
                mode,
                length,
                mut data,
            } => {
                data.push(byte);
                if data.len() < length {
                    Parser::Payload { mode, length, data }
                } else {
                    Self::store(&mut state, &mut self.outbox, mode, data)
                }
            }
        };
    }

    fn store(state: &mut BoardState, outbox: &mut VecDeque<u8>, mode: u8, mut data: Vec<u8>) -> Parser {
        if mode == b'R' {
            state.ram = Some(data);
        } else {
            if let Some(offset) = state.corrupt_flash_at {
                if let Some(byte) = data.get_mut(offset) {
                    *byte ^= 0x01;
                }
            }
            state.flash = Some(data);
        }
        outbox.push_back(b'D');
        Parser::Command
    }
}

impl DeviceInterface for SimulatedBoard {
    fn send(&mut self, bytes: &[u8]) -> MojoResult<()> {
        for &byte in bytes {
            self.feed(byte);
        }
        Ok(())
    }

    fn receive(&mut self, expected_bytes: usize) -> MojoResult<Vec<u8>> {
        if self.outbox.len() < expected_bytes {
            return Err(MojoError::Timeout {
                expected: expected_bytes,
                received: self.outbox.len(),
            });
        }
        Ok(self.outbox.drain(..expected_bytes).collect())
    }

    fn set_reset(&mut self, asserted: bool) -> MojoResult<()> {
        if !asserted && self.reset_line {
            self.pulses += 1;
        }
        self.reset_line = asserted;

        // Fresh boot once the full pulse train has been seen
        if asserted && self.pulses >= 5 {
            self.pulses = 0;
            self.state.borrow_mut().reboots += 1;
            self.outbox.clear();
            self.parser = Parser::Command;
        }
        Ok(())
    }
}

pub fn bitstream(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
