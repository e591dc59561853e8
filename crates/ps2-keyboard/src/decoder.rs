//! Set-1 scan code decoder.

use crate::keymap::logical;
use crate::protocol::{SCAN_EXTEND, SCAN_PAUSE, SCAN_RELEASE_BIT};
use crate::sink::PowerSink;

/// Decoder position within an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Normal,
    /// Saw `E0`; the next byte is an extended code.
    ExtendPending,
    /// Saw `E1`; the next byte is padding.
    PauseDrop1,
    /// The next byte is the pause key itself.
    PauseDrop2,
}

/// A decoded make or break of a logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    pub code: u8,
    pub released: bool,
}

enum Extended {
    Key(u8),
    Sleep,
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ScancodeDecoder {
    state: DecoderState,
    swap_alt_meta: bool,
}

impl ScancodeDecoder {
    pub fn new(swap_alt_meta: bool) -> Self {
        Self {
            state: DecoderState::Normal,
            swap_alt_meta,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DecoderState::Normal;
    }

    /// Feeds one byte from the wire.
    ///
    /// Returns `None` for prefixes, pause padding, print-screen framing,
    /// unknown extended codes and the sleep key. The sleep key's make also asks
    /// `power` to suspend the machine; with no sink it is dropped.
    pub fn decode(&mut self, byte: u8, power: Option<&mut dyn PowerSink>) -> Option<KeyTransition> {
        // A prefix always starts a fresh sequence, discarding any in progress.
        match byte {
            SCAN_EXTEND => {
                self.state = DecoderState::ExtendPending;
                return None;
            }
            SCAN_PAUSE => {
                self.state = DecoderState::PauseDrop1;
                return None;
            }
            _ => {}
        }

        let released = byte & SCAN_RELEASE_BIT != 0;
        let raw = byte & !SCAN_RELEASE_BIT;

        let code = match std::mem::take(&mut self.state) {
            DecoderState::Normal => self.swap_alt(raw),
            DecoderState::PauseDrop1 => {
                self.state = DecoderState::PauseDrop2;
                return None;
            }
            DecoderState::ExtendPending | DecoderState::PauseDrop2 => match self.extended(raw) {
                Extended::Key(code) => code,
                Extended::Sleep => {
                    if !released {
                        request_sleep(power);
                    }
                    return None;
                }
                Extended::Ignored => {
                    tracing::trace!(code = raw, "discarding extended scan code");
                    return None;
                }
            },
        };

        if code == logical::NONE {
            return None;
        }
        Some(KeyTransition { code, released })
    }

    fn swap_alt(&self, code: u8) -> u8 {
        if !self.swap_alt_meta {
            return code;
        }
        match code {
            logical::LEFT_ALT => logical::LEFT_COMMAND,
            logical::RIGHT_ALT => logical::RIGHT_COMMAND,
            other => other,
        }
    }

    fn extended(&self, raw: u8) -> Extended {
        let code = match raw {
            0x1D => logical::RIGHT_CONTROL,
            0x38 => self.swap_alt(logical::RIGHT_ALT),
            0x1C => logical::KEYPAD_ENTER,
            0x35 => logical::KEYPAD_SLASH,
            0x48 => logical::UP_ARROW,
            0x50 => logical::DOWN_ARROW,
            0x4B => logical::LEFT_ARROW,
            0x4D => logical::RIGHT_ARROW,
            0x52 => logical::INSERT,
            0x53 => logical::DELETE,
            0x49 => logical::PAGE_UP,
            0x51 => logical::PAGE_DOWN,
            0x47 => logical::HOME,
            0x4F => logical::END,
            0x37 => logical::PRINT_SCREEN,
            0x45 => logical::PAUSE,
            0x5D => logical::APPLICATION,
            0x5B if self.swap_alt_meta => logical::LEFT_ALT,
            0x5B => logical::LEFT_COMMAND,
            0x5C if self.swap_alt_meta => logical::RIGHT_ALT,
            0x5C => logical::RIGHT_COMMAND,
            0x30 => logical::VOLUME_UP,
            0x2E => logical::VOLUME_DOWN,
            0x20 => logical::MUTE,
            0x5E => logical::POWER,
            0x5F => return Extended::Sleep,
            // 0x2A frames print screen; everything else is unassigned.
            _ => return Extended::Ignored,
        };
        Extended::Key(code)
    }
}

fn request_sleep(power: Option<&mut dyn PowerSink>) {
    match power {
        Some(power) => {
            tracing::info!("sleep key pressed; requesting system sleep");
            power.sleep_now();
        }
        None => tracing::debug!("sleep key pressed with no power sink attached"),
    }
}
