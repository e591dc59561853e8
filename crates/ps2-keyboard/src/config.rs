use serde::Deserialize;

use crate::command_byte::DEFAULT_MAX_ATTEMPTS;
use crate::error::{DriverError, Result};
use crate::keymap::delivered;

/// Remapping options, read once when the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RemapConfig {
    /// Delivered code substituted for the caps-lock key.
    pub capslock_target: u8,
    /// Exchange the alt and windows/command positions.
    pub swap_alt_meta: bool,
    /// Enable the function-key overlay and its latch keys.
    pub remap_function_keys: bool,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            capslock_target: delivered::CAPS_LOCK,
            swap_alt_meta: false,
            remap_function_keys: false,
        }
    }
}

impl RemapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capslock_target == 0 {
            return Err(DriverError::InvalidConfig("capslock-target must be a key code"));
        }
        Ok(())
    }
}

/// Latch keys for the function-key overlay. While any of them is held the
/// overlay is bypassed; the keys themselves are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct OverlayLayer {
    latch_keys: Vec<u8>,
}

/// Latch state is a bitmask, one bit per latch key.
pub const MAX_LATCH_KEYS: usize = 32;

impl OverlayLayer {
    pub fn new(latch_keys: Vec<u8>) -> Self {
        Self { latch_keys }
    }

    pub fn latch_keys(&self) -> &[u8] {
        &self.latch_keys
    }

    /// Index of `code` among the latch keys.
    pub fn latch_index(&self, code: u8) -> Option<usize> {
        self.latch_keys.iter().position(|&k| k == code)
    }

    pub fn validate(&self) -> Result<()> {
        if self.latch_keys.len() > MAX_LATCH_KEYS {
            return Err(DriverError::InvalidConfig("too many overlay latch keys"));
        }
        if self.latch_keys.contains(&0) {
            return Err(DriverError::InvalidConfig("overlay latch key must be a key code"));
        }
        Ok(())
    }
}

impl Default for OverlayLayer {
    /// The insert and application positions.
    fn default() -> Self {
        Self::new(vec![delivered::INSERT, delivered::APPLICATION])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    #[serde(flatten)]
    pub remap: RemapConfig,
    pub overlay: OverlayLayer,
    /// Bound on command-byte read-modify-write attempts.
    pub max_command_byte_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            remap: RemapConfig::default(),
            overlay: OverlayLayer::default(),
            max_command_byte_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        self.remap.validate()?;
        self.overlay.validate()?;
        if self.max_command_byte_attempts == 0 {
            return Err(DriverError::InvalidConfig(
                "max-command-byte-attempts must be at least 1",
            ));
        }
        Ok(())
    }
}
