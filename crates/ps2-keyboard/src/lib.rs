//! PS/2 keyboard driver core.
//!
//! Bytes from the keyboard flow through a fixed, non-blocking pipeline:
//!
//! ```text
//! scan byte -> ScancodeDecoder -> KeyBitVector (drop repeats) -> KeycodeRemapper -> KeyEventSink
//! ```
//!
//! Controller configuration (the i8042 command byte) and keyboard commands
//! (LEDs, scan enable) go through a [`Ps2Transport`]. Command-byte updates
//! block and retry optimistically; everything else is fire-and-forget.
//! [`KeyboardSession`] owns one keyboard's state and ties the pieces together.

mod clock;
mod command_byte;
mod config;
mod controller;
mod decoder;
mod error;
pub mod i8042;
mod key_state;
pub mod keymap;
pub mod protocol;
mod remap;
mod session;
mod sink;
mod transport;

pub use crate::clock::{Clock, FakeClock, MonotonicClock};
pub use crate::command_byte::{update_command_byte, DEFAULT_MAX_ATTEMPTS};
pub use crate::config::{OverlayLayer, RemapConfig, SessionConfig, MAX_LATCH_KEYS};
pub use crate::controller::{probe, set_leds, set_reporting_enabled};
pub use crate::decoder::{DecoderState, KeyTransition, ScancodeDecoder};
pub use crate::error::{DriverError, Result};
pub use crate::i8042::I8042Model;
pub use crate::key_state::KeyBitVector;
pub use crate::keymap::TranslationTable;
pub use crate::protocol::{CommandByte, LedState};
pub use crate::remap::{KeycodeRemapper, OverlayLatchState, RemapOutcome};
pub use crate::session::{DeviceInfo, KeyboardSession, PowerAction, DEVICE_INFO};
pub use crate::sink::{KeyEvent, KeyEventSink, PowerSink};
pub use crate::transport::{PortCommand, Ps2Request, Ps2Transport, MAX_REQUEST_COMMANDS};
