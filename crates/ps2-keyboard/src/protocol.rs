//! Wire-level constants shared by the decoder, the controller commands and the
//! i8042 model.

use bitflags::bitflags;

/// Release ("break") flag in a Set-1 scan byte.
pub const SCAN_RELEASE_BIT: u8 = 0x80;
/// Prefix for the extended (`E0 xx`) key block.
pub const SCAN_EXTEND: u8 = 0xE0;
/// Prefix for the pause key (`E1 1D 45` / `E1 9D C5`).
pub const SCAN_PAUSE: u8 = 0xE1;

pub const RESPONSE_ACK: u8 = 0xFA;
pub const RESPONSE_RESEND: u8 = 0xFE;
pub const RESPONSE_ECHO: u8 = 0xEE;
pub const RESPONSE_SELF_TEST_OK: u8 = 0xAA;

/// Controller commands, written to the command port (0x64).
pub const CTRL_READ_COMMAND_BYTE: u8 = 0x20;
pub const CTRL_WRITE_COMMAND_BYTE: u8 = 0x60;

/// Keyboard commands, written to the data port (0x60).
pub const KBD_SET_LEDS: u8 = 0xED;
pub const KBD_ECHO: u8 = 0xEE;
pub const KBD_ENABLE: u8 = 0xF4;
pub const KBD_SET_DEFAULTS_AND_DISABLE: u8 = 0xF5;
pub const KBD_SET_DEFAULTS: u8 = 0xF6;
pub const KBD_RESET: u8 = 0xFF;

bitflags! {
    /// The i8042 controller configuration ("command") byte.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct CommandByte: u8 {
        const KEYBOARD_IRQ = 1 << 0;
        const MOUSE_IRQ = 1 << 1;
        const SYSTEM = 1 << 2;
        const DISABLE_KEYBOARD_CLOCK = 1 << 4;
        const DISABLE_MOUSE_CLOCK = 1 << 5;
        const TRANSLATE = 1 << 6;
    }
}

bitflags! {
    /// Indicator bits carried by the keyboard "set LEDs" command.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct LedState: u8 {
        const SCROLL_LOCK = 1 << 0;
        const NUM_LOCK = 1 << 1;
        const CAPS_LOCK = 1 << 2;
    }
}
