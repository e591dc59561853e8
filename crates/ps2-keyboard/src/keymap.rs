//! Key numbering.
//!
//! The decoder produces *logical* codes: the low 7 bits of a Set-1 make code,
//! with the `E0`-prefixed keys folded into the otherwise unused 0x60..0x7F
//! block. The translation table turns those into *delivered* codes (ADB
//! virtual key codes), which is what the host input subsystem consumes.

/// Logical (driver-internal) key positions.
pub mod logical {
    /// "No key" sentinel; never dispatched.
    pub const NONE: u8 = 0x00;

    pub const LEFT_ALT: u8 = 0x38;
    pub const CAPS_LOCK: u8 = 0x3A;
    pub const F1: u8 = 0x3B;
    pub const F2: u8 = 0x3C;
    pub const F3: u8 = 0x3D;

    pub const RIGHT_CONTROL: u8 = 0x60;
    pub const RIGHT_ALT: u8 = 0x61;
    pub const KEYPAD_ENTER: u8 = 0x62;
    pub const KEYPAD_SLASH: u8 = 0x63;
    pub const UP_ARROW: u8 = 0x64;
    pub const DOWN_ARROW: u8 = 0x65;
    pub const LEFT_ARROW: u8 = 0x66;
    pub const RIGHT_ARROW: u8 = 0x67;
    pub const INSERT: u8 = 0x68;
    pub const DELETE: u8 = 0x69;
    pub const PAGE_UP: u8 = 0x6A;
    pub const PAGE_DOWN: u8 = 0x6B;
    pub const HOME: u8 = 0x6C;
    pub const END: u8 = 0x6D;
    pub const PRINT_SCREEN: u8 = 0x6E;
    pub const PAUSE: u8 = 0x6F;
    pub const LEFT_COMMAND: u8 = 0x70;
    pub const RIGHT_COMMAND: u8 = 0x71;
    pub const APPLICATION: u8 = 0x72;
    pub const POWER: u8 = 0x7C;
    pub const VOLUME_UP: u8 = 0x7D;
    pub const VOLUME_DOWN: u8 = 0x7E;
    pub const MUTE: u8 = 0x7F;
}

/// Delivered (ADB virtual) key codes referenced by the remapper.
pub mod delivered {
    pub const LEFT_COMMAND: u8 = 0x37;
    pub const CAPS_LOCK: u8 = 0x39;
    pub const LEFT_ALT: u8 = 0x3A;
    pub const RIGHT_COMMAND: u8 = 0x36;
    pub const RIGHT_ALT: u8 = 0x3D;
    pub const RIGHT_CONTROL: u8 = 0x3E;
    pub const UP_ARROW: u8 = 0x7E;

    pub const VOLUME_UP: u8 = 0x48;
    pub const VOLUME_DOWN: u8 = 0x49;
    pub const MUTE: u8 = 0x4A;
    pub const APPLICATION: u8 = 0x6E;
    pub const INSERT: u8 = 0x72;

    pub const F1: u8 = 0x7A;
    pub const F2: u8 = 0x78;
    pub const F3: u8 = 0x63;
    pub const F4: u8 = 0x76;
    pub const F5: u8 = 0x60;
    pub const F6: u8 = 0x61;
    pub const F7: u8 = 0x62;
    pub const F8: u8 = 0x64;
    pub const F9: u8 = 0x65;
    pub const F10: u8 = 0x6D;
    pub const F11: u8 = 0x67;
    pub const F12: u8 = 0x6F;

    pub const BRIGHTNESS_UP: u8 = 0x90;
    pub const BRIGHTNESS_DOWN: u8 = 0x91;
    // Media keys have no ADB position; these sit outside the standard map.
    pub const MEDIA_PREVIOUS: u8 = 0xA1;
    pub const MEDIA_PLAY: u8 = 0xA2;
    pub const MEDIA_NEXT: u8 = 0xA3;
}

/// Number of logical key positions.
pub const KEY_COUNT: usize = 128;

#[rustfmt::skip]
const PC_TO_ADB: [u8; KEY_COUNT] = [
    // 0x00
    0x00, 0x35, 0x12, 0x13, 0x14, 0x15, 0x17, 0x16,
    0x1A, 0x1C, 0x19, 0x1D, 0x1B, 0x18, 0x33, 0x30,
    // 0x10
    0x0C, 0x0D, 0x0E, 0x0F, 0x11, 0x10, 0x20, 0x22,
    0x1F, 0x23, 0x21, 0x1E, 0x24, 0x3B, 0x00, 0x01,
    // 0x20
    0x02, 0x03, 0x05, 0x04, 0x26, 0x28, 0x25, 0x29,
    0x27, 0x32, 0x38, 0x2A, 0x06, 0x07, 0x08, 0x09,
    // 0x30
    0x0B, 0x2D, 0x2E, 0x2B, 0x2F, 0x2C, 0x3C, 0x43,
    0x3A, 0x31, 0x39, 0x7A, 0x78, 0x63, 0x76, 0x60,
    // 0x40
    0x61, 0x62, 0x64, 0x65, 0x6D, 0x47, 0x6B, 0x59,
    0x5B, 0x5C, 0x4E, 0x56, 0x57, 0x58, 0x45, 0x53,
    // 0x50
    0x54, 0x55, 0x52, 0x41, 0x00, 0x00, 0x0A, 0x67,
    0x6F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // 0x60: folded E0 block
    0x3E, 0x3D, 0x4C, 0x4B, 0x7E, 0x7D, 0x7B, 0x7C,
    0x72, 0x75, 0x74, 0x79, 0x73, 0x77, 0x69, 0x71,
    // 0x70
    0x37, 0x36, 0x6E, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x7F, 0x48, 0x49, 0x4A,
];

/// Load-time-fixed mapping from logical position to delivered code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTable {
    map: [u8; KEY_COUNT],
}

impl TranslationTable {
    pub const fn new(map: [u8; KEY_COUNT]) -> Self {
        Self { map }
    }

    /// US layout, PC position to ADB virtual key code.
    pub const fn pc_to_adb() -> Self {
        Self::new(PC_TO_ADB)
    }

    pub fn translate(&self, logical: u8) -> u8 {
        self.map[usize::from(logical) % KEY_COUNT]
    }
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::pc_to_adb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_remapped_positions() {
        let table = TranslationTable::pc_to_adb();
        assert_eq!(table.translate(logical::CAPS_LOCK), delivered::CAPS_LOCK);
        assert_eq!(table.translate(logical::LEFT_ALT), delivered::LEFT_ALT);
        assert_eq!(table.translate(logical::LEFT_COMMAND), delivered::LEFT_COMMAND);
        assert_eq!(table.translate(logical::RIGHT_ALT), delivered::RIGHT_ALT);
        assert_eq!(table.translate(logical::RIGHT_COMMAND), delivered::RIGHT_COMMAND);
        assert_eq!(table.translate(logical::RIGHT_CONTROL), delivered::RIGHT_CONTROL);
        assert_eq!(table.translate(logical::UP_ARROW), delivered::UP_ARROW);
        assert_eq!(table.translate(logical::INSERT), delivered::INSERT);
        assert_eq!(table.translate(logical::APPLICATION), delivered::APPLICATION);
        assert_eq!(table.translate(logical::F1), delivered::F1);
        assert_eq!(table.translate(logical::F3), delivered::F3);
        assert_eq!(table.translate(0x58), delivered::F12);
        assert_eq!(table.translate(logical::MUTE), delivered::MUTE);
    }
}
