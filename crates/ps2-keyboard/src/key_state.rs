use crate::keymap::KEY_COUNT;

const WORDS: usize = KEY_COUNT / 32;

/// Down/up state of every logical key, used to drop hardware autorepeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyBitVector {
    bits: [u32; WORDS],
}

impl KeyBitVector {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(code: u8) -> (usize, u32) {
        let index = usize::from(code) % KEY_COUNT;
        (index / 32, 1 << (index % 32))
    }

    pub fn is_down(&self, code: u8) -> bool {
        let (word, mask) = Self::slot(code);
        self.bits[word] & mask != 0
    }

    /// Records a transition and reports whether it should be delivered.
    ///
    /// A make for a key already down is a repeat: it is rejected and leaves the
    /// state alone. A break is always delivered, even for a key that was never
    /// seen going down.
    pub fn accept(&mut self, code: u8, released: bool) -> bool {
        let (word, mask) = Self::slot(code);
        if released {
            self.bits[word] &= !mask;
            return true;
        }
        if self.bits[word] & mask != 0 {
            return false;
        }
        self.bits[word] |= mask;
        true
    }

    pub fn any_down(&self) -> bool {
        self.bits.iter().any(|&w| w != 0)
    }

    pub fn clear(&mut self) {
        self.bits = [0; WORDS];
    }
}
