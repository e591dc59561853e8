//! In-process i8042 controller and keyboard model implementing [`Ps2Transport`].
//!
//! Requests execute synchronously against the model, so "async" submissions
//! complete before `submit_async` returns. Hooks let callers simulate another
//! context rewriting the command byte between round trips, or a device that
//! stops answering.

use std::collections::VecDeque;
use std::fmt;

use crate::error::{DriverError, Result};
use crate::protocol::{
    LedState, CTRL_READ_COMMAND_BYTE, CTRL_WRITE_COMMAND_BYTE, KBD_ECHO, KBD_ENABLE, KBD_RESET,
    KBD_SET_DEFAULTS, KBD_SET_DEFAULTS_AND_DISABLE, KBD_SET_LEDS, RESPONSE_ACK, RESPONSE_ECHO,
    RESPONSE_SELF_TEST_OK,
};
use crate::transport::{PortCommand, Ps2Request, Ps2Transport};

/// Power-on command byte: keyboard IRQ, system flag and translation enabled.
pub const DEFAULT_COMMAND_BYTE: u8 = 0x45;

/// Called after every blocking round trip with the current command byte; a
/// `Some` return overwrites it, as if another context wrote the register.
pub type CommandByteHook = Box<dyn FnMut(u8) -> Option<u8>>;

/// Keyboard half of the model: answers the data-port commands the driver sends.
#[derive(Debug)]
struct KeyboardModel {
    leds: LedState,
    scanning_enabled: bool,
    /// The previous byte was `ED`; this one carries the LED bits.
    expecting_leds: bool,
}

impl KeyboardModel {
    fn new() -> Self {
        Self {
            leds: LedState::empty(),
            scanning_enabled: true,
            expecting_leds: false,
        }
    }

    fn set_defaults(&mut self) {
        self.leds = LedState::empty();
    }

    fn receive_byte(&mut self, byte: u8, out: &mut VecDeque<u8>) {
        if std::mem::take(&mut self.expecting_leds) {
            self.leds = LedState::from_bits_truncate(byte);
            out.push_back(RESPONSE_ACK);
            return;
        }

        match byte {
            KBD_SET_LEDS => {
                out.push_back(RESPONSE_ACK);
                self.expecting_leds = true;
            }
            KBD_ECHO => out.push_back(RESPONSE_ECHO),
            KBD_ENABLE => {
                self.scanning_enabled = true;
                out.push_back(RESPONSE_ACK);
            }
            KBD_SET_DEFAULTS_AND_DISABLE => {
                self.set_defaults();
                self.scanning_enabled = false;
                out.push_back(RESPONSE_ACK);
            }
            KBD_SET_DEFAULTS => {
                self.set_defaults();
                self.scanning_enabled = true;
                out.push_back(RESPONSE_ACK);
            }
            KBD_RESET => {
                self.set_defaults();
                self.scanning_enabled = true;
                out.push_back(RESPONSE_ACK);
                out.push_back(RESPONSE_SELF_TEST_OK);
            }
            _ => out.push_back(RESPONSE_ACK),
        }
    }
}

pub struct I8042Model {
    command_byte: u8,
    expecting_command_byte: bool,
    keyboard: KeyboardModel,
    out: VecDeque<u8>,
    command_byte_hook: Option<CommandByteHook>,
    unresponsive: bool,
    blocking_submissions: usize,
    async_submissions: usize,
    abandoned_async: usize,
    command_byte_writes: usize,
}

impl I8042Model {
    pub fn new() -> Self {
        Self {
            command_byte: DEFAULT_COMMAND_BYTE,
            expecting_command_byte: false,
            keyboard: KeyboardModel::new(),
            out: VecDeque::new(),
            command_byte_hook: None,
            unresponsive: false,
            blocking_submissions: 0,
            async_submissions: 0,
            abandoned_async: 0,
            command_byte_writes: 0,
        }
    }

    pub fn command_byte(&self) -> u8 {
        self.command_byte
    }

    /// Writes the register directly, bypassing any request.
    pub fn set_command_byte(&mut self, value: u8) {
        self.command_byte = value;
    }

    pub fn set_command_byte_hook(&mut self, hook: CommandByteHook) {
        self.command_byte_hook = Some(hook);
    }

    /// While set, every blocking submission fails with a timeout and async
    /// submissions are dropped.
    pub fn set_unresponsive(&mut self, unresponsive: bool) {
        self.unresponsive = unresponsive;
    }

    pub fn leds(&self) -> LedState {
        self.keyboard.leds
    }

    pub fn scanning_enabled(&self) -> bool {
        self.keyboard.scanning_enabled
    }

    pub fn blocking_submissions(&self) -> usize {
        self.blocking_submissions
    }

    pub fn async_submissions(&self) -> usize {
        self.async_submissions
    }

    /// Async requests dropped because a step failed.
    pub fn abandoned_async(&self) -> usize {
        self.abandoned_async
    }

    /// Number of times a request actually wrote the command byte.
    pub fn command_byte_writes(&self) -> usize {
        self.command_byte_writes
    }

    /// Queues bytes on the data port as if the keyboard had sent them.
    pub fn push_output(&mut self, bytes: &[u8]) {
        self.out.extend(bytes.iter().copied());
    }

    fn write_command(&mut self, byte: u8) {
        match byte {
            CTRL_READ_COMMAND_BYTE => self.out.push_back(self.command_byte),
            CTRL_WRITE_COMMAND_BYTE => self.expecting_command_byte = true,
            other => tracing::trace!(command = other, "i8042 model ignoring controller command"),
        }
    }

    fn write_data(&mut self, byte: u8) {
        if std::mem::take(&mut self.expecting_command_byte) {
            self.command_byte = byte;
            self.command_byte_writes += 1;
        } else {
            self.keyboard.receive_byte(byte, &mut self.out);
        }
    }

    fn execute(&mut self, request: &mut Ps2Request) -> Result<()> {
        request.reset_progress();
        for index in 0..request.len() {
            match request.commands()[index] {
                PortCommand::WriteCommand(byte) => {
                    self.write_command(byte);
                    request.complete_step(None);
                }
                PortCommand::WriteData(byte) => {
                    self.write_data(byte);
                    request.complete_step(None);
                }
                PortCommand::ReadData => {
                    let byte = self.out.pop_front().ok_or(DriverError::TransportTimeout)?;
                    request.complete_step(Some(byte));
                }
                PortCommand::ReadDataAndCompare(expected) => {
                    let byte = self.out.pop_front().ok_or(DriverError::TransportTimeout)?;
                    if byte != expected {
                        tracing::trace!(
                            expected,
                            got = byte,
                            step = index,
                            "i8042 model compare failed"
                        );
                        return Ok(());
                    }
                    request.complete_step(Some(byte));
                }
            }
        }
        Ok(())
    }
}

impl Default for I8042Model {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for I8042Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I8042Model")
            .field("command_byte", &format_args!("{:#04x}", self.command_byte))
            .field("keyboard", &self.keyboard)
            .field("pending_output", &self.out.len())
            .field("unresponsive", &self.unresponsive)
            .finish_non_exhaustive()
    }
}

impl Ps2Transport for I8042Model {
    fn submit_blocking(&mut self, request: &mut Ps2Request) -> Result<()> {
        self.blocking_submissions += 1;
        if self.unresponsive {
            request.reset_progress();
            return Err(DriverError::TransportTimeout);
        }

        let result = self.execute(request);

        if let Some(hook) = self.command_byte_hook.as_mut() {
            if let Some(value) = hook(self.command_byte) {
                self.command_byte = value;
            }
        }
        result
    }

    fn submit_async(&mut self, mut request: Ps2Request) {
        self.async_submissions += 1;
        if self.unresponsive {
            self.abandoned_async += 1;
            tracing::warn!("PS/2 device not responding; dropping async request");
            return;
        }

        match self.execute(&mut request) {
            Ok(()) if request.is_complete() => {}
            Ok(()) => {
                self.abandoned_async += 1;
                tracing::warn!(
                    completed = request.completed(),
                    len = request.len(),
                    "unexpected PS/2 device response; abandoning async request"
                );
            }
            Err(err) => {
                self.abandoned_async += 1;
                tracing::warn!(%err, "async PS/2 request failed");
            }
        }
    }
}
