//! Logical key → delivered key remapping, including the function-key overlay.

use crate::config::{OverlayLayer, RemapConfig};
use crate::key_state::KeyBitVector;
use crate::keymap::{delivered, TranslationTable};

/// What to hand the input subsystem for one accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapOutcome {
    Emit(u8),
    /// Synthetic events replacing the original, delivered in order with one
    /// shared timestamp and the triggering key's direction.
    EmitMany(&'static [u8]),
    /// Consumed; nothing is delivered.
    Suppress,
}

/// Held/released state of each overlay latch key, plus the logical keys
/// whose current press went through the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayLatchState {
    held: u32,
    overlaid: KeyBitVector,
}

impl OverlayLatchState {
    pub fn is_held(&self, index: usize) -> bool {
        self.held & (1 << index) != 0
    }

    pub fn any_held(&self) -> bool {
        self.held != 0
    }

    fn set(&mut self, index: usize, held: bool) {
        if held {
            self.held |= 1 << index;
        } else {
            self.held &= !(1 << index);
        }
    }

    /// Decides whether `logical` takes the overlay. A release follows its
    /// press, so a latch key pressed in between cannot strand a remapped make.
    fn overlay_applies(&mut self, logical: u8, pressed: bool) -> bool {
        if pressed {
            let applies = !self.any_held();
            if applies {
                self.overlaid.accept(logical, false);
            }
            applies
        } else {
            let applied = self.overlaid.is_down(logical);
            self.overlaid.accept(logical, true);
            applied
        }
    }

    pub fn clear(&mut self) {
        self.held = 0;
        self.overlaid.clear();
    }
}

const MISSION_CONTROL_CHORD: &[u8] = &[delivered::RIGHT_CONTROL, delivered::UP_ARROW];

/// Function-row overlay. Unlisted codes pass through.
fn function_overlay(code: u8) -> RemapOutcome {
    let mapped = match code {
        delivered::F1 => delivered::BRIGHTNESS_DOWN,
        delivered::F2 => delivered::BRIGHTNESS_UP,
        delivered::F3 => return RemapOutcome::EmitMany(MISSION_CONTROL_CHORD),
        // F12 is bound to the dashboard.
        delivered::F4 => delivered::F12,
        delivered::F7 => delivered::MEDIA_PREVIOUS,
        delivered::F8 => delivered::MEDIA_PLAY,
        delivered::F9 => delivered::MEDIA_NEXT,
        delivered::F10 => delivered::MUTE,
        delivered::F11 => delivered::VOLUME_DOWN,
        delivered::F12 => delivered::VOLUME_UP,
        other => other,
    };
    RemapOutcome::Emit(mapped)
}

#[derive(Debug, Clone)]
pub struct KeycodeRemapper {
    table: TranslationTable,
    config: RemapConfig,
    layer: OverlayLayer,
}

impl KeycodeRemapper {
    pub fn new(table: TranslationTable, config: RemapConfig, layer: OverlayLayer) -> Self {
        Self {
            table,
            config,
            layer,
        }
    }

    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    pub fn layer(&self) -> &OverlayLayer {
        &self.layer
    }

    /// Maps a logical transition to its delivered form, updating `latch` when
    /// the key is one of the overlay's latch keys.
    pub fn remap(&self, logical: u8, pressed: bool, latch: &mut OverlayLatchState) -> RemapOutcome {
        let mut code = self.table.translate(logical);
        if code == delivered::CAPS_LOCK {
            code = self.config.capslock_target;
        }

        if !self.config.remap_function_keys {
            return RemapOutcome::Emit(code);
        }

        if let Some(index) = self.layer.latch_index(code) {
            latch.set(index, pressed);
            return RemapOutcome::Suppress;
        }

        if !latch.overlay_applies(logical, pressed) {
            return RemapOutcome::Emit(code);
        }

        function_overlay(code)
    }
}
