//! Read-modify-write of the controller command byte.
//!
//! The i8042 has no atomic update for its command byte, and other contexts
//! (firmware, the mouse driver) may rewrite it at any time. Each attempt reads
//! the byte, then submits a sequence that re-reads it, compares against the
//! value just seen and only then writes the new value. A failed comparison means
//! someone else got there first; the attempt is discarded and retried.

use crate::error::{DriverError, Result};
use crate::protocol::{CommandByte, CTRL_READ_COMMAND_BYTE, CTRL_WRITE_COMMAND_BYTE};
use crate::transport::{PortCommand, Ps2Request, Ps2Transport};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Index of the compare step in the conditional write; reaching it but not
/// passing it means the register changed.
const COMPARE_STEP: usize = 1;

fn read_request() -> Ps2Request {
    Ps2Request::from_commands(&[
        PortCommand::WriteCommand(CTRL_READ_COMMAND_BYTE),
        PortCommand::ReadData,
    ])
}

fn conditional_write_request(expected: u8, new: u8) -> Ps2Request {
    Ps2Request::from_commands(&[
        PortCommand::WriteCommand(CTRL_READ_COMMAND_BYTE),
        PortCommand::ReadDataAndCompare(expected),
        PortCommand::WriteCommand(CTRL_WRITE_COMMAND_BYTE),
        PortCommand::WriteData(new),
    ])
}

/// Sets `set` and clears `clear` in the command byte, preserving every other
/// bit as found on the device. Returns the value written.
///
/// Blocks on each round trip; never call this from the byte-delivery path.
pub fn update_command_byte<T: Ps2Transport + ?Sized>(
    transport: &mut T,
    set: CommandByte,
    clear: CommandByte,
    max_attempts: u32,
) -> Result<u8> {
    for attempt in 1..=max_attempts {
        let mut read = read_request();
        transport.submit_blocking(&mut read)?;
        let old = read.read_byte(1).ok_or(DriverError::TransportTimeout)?;
        let new = (old | set.bits()) & !clear.bits();

        let mut write = conditional_write_request(old, new);
        transport.submit_blocking(&mut write)?;

        match write.completed() {
            n if n == write.len() => {
                tracing::debug!(attempt, old, new, "command byte updated");
                return Ok(new);
            }
            COMPARE_STEP => {
                tracing::debug!(attempt, old, "command byte changed during update; retrying");
            }
            completed => {
                tracing::warn!(attempt, old, completed, "command byte update stopped early");
                return Err(DriverError::UnexpectedDeviceResponse {
                    expected: old,
                    completed,
                });
            }
        }
    }

    tracing::warn!(max_attempts, "command byte update starved by concurrent writers");
    Err(DriverError::ContentionExhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i8042::{I8042Model, DEFAULT_COMMAND_BYTE};

    #[test]
    fn uncontended_update_takes_one_attempt() {
        let mut model = I8042Model::new();
        let new = update_command_byte(
            &mut model,
            CommandByte::KEYBOARD_IRQ | CommandByte::TRANSLATE,
            CommandByte::DISABLE_KEYBOARD_CLOCK,
            DEFAULT_MAX_ATTEMPTS,
        )
        .unwrap();
        assert_eq!(new, DEFAULT_COMMAND_BYTE);
        assert_eq!(model.command_byte(), DEFAULT_COMMAND_BYTE);
        assert_eq!(model.blocking_submissions(), 2);
        assert_eq!(model.command_byte_writes(), 1);
    }

    #[test]
    fn preserves_unrelated_bits() {
        let mut model = I8042Model::new();
        model.set_command_byte(0x23);
        let new = update_command_byte(
            &mut model,
            CommandByte::DISABLE_KEYBOARD_CLOCK,
            CommandByte::KEYBOARD_IRQ,
            DEFAULT_MAX_ATTEMPTS,
        )
        .unwrap();
        assert_eq!(new, 0x32);
        assert_eq!(model.command_byte(), 0x32);
    }

    #[test]
    fn timeout_is_propagated() {
        let mut model = I8042Model::new();
        model.set_unresponsive(true);
        let err = update_command_byte(
            &mut model,
            CommandByte::KEYBOARD_IRQ,
            CommandByte::empty(),
            DEFAULT_MAX_ATTEMPTS,
        )
        .unwrap_err();
        assert_eq!(err, DriverError::TransportTimeout);
        assert_eq!(model.blocking_submissions(), 1);
    }

    /// Answers reads with `0x45` but stops every longer request after three
    /// steps, past the compare.
    struct StallsBeforeData;

    impl Ps2Transport for StallsBeforeData {
        fn submit_blocking(&mut self, request: &mut Ps2Request) -> Result<()> {
            request.reset_progress();
            request.complete_step(None);
            request.complete_step(Some(0x45));
            if request.len() > 2 {
                request.complete_step(None);
            }
            Ok(())
        }

        fn submit_async(&mut self, _request: Ps2Request) {}
    }

    #[test]
    fn stall_after_compare_is_an_unexpected_response() {
        let err = update_command_byte(
            &mut StallsBeforeData,
            CommandByte::TRANSLATE,
            CommandByte::empty(),
            DEFAULT_MAX_ATTEMPTS,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DriverError::UnexpectedDeviceResponse {
                expected: 0x45,
                completed: 3,
            }
        );
    }

    #[test]
    fn persistent_contention_is_bounded() {
        let mut model = I8042Model::new();
        let mut flip = 0u8;
        model.set_command_byte_hook(Box::new(move |_| {
            flip ^= 0x80;
            Some(0x45 | flip)
        }));
        let err = update_command_byte(
            &mut model,
            CommandByte::KEYBOARD_IRQ,
            CommandByte::empty(),
            4,
        )
        .unwrap_err();
        assert_eq!(err, DriverError::ContentionExhausted { attempts: 4 });
        assert_eq!(model.command_byte_writes(), 0);
        assert_eq!(model.blocking_submissions(), 8);
    }
}
