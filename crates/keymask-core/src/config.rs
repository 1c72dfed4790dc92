//! Masking configuration.
//!
//! All tunables of the trigger and masking protocol. Hosts may persist a
//! [`MaskConfig`] with serde; missing fields fall back to the defaults below.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key code of the password hotkey (F2).
pub const DEFAULT_HOTKEY_CODE: u32 = 113;

/// Typed prefix that starts protection in the focused field.
pub const DEFAULT_PREFIX: &str = "@@";

/// Shortest accepted password after the prefix is stripped.
///
/// Also our defense against focus stealing: a script that steals focus early
/// only gets a hash of a short fragment if this is too low.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 5;

/// First mask code handed out.
pub const DEFAULT_MASK_BASE: char = 'A';

/// Last mask code handed out (last printable ASCII position).
pub const DEFAULT_MASK_CEILING: char = '\u{7f}';

/// Key codes `0` through numpad divide. Their keydown/keyup would reveal what
/// was typed.
pub const DEFAULT_CONCEALED_KEYS: RangeInclusive<u32> = 48..=111;

const SURROGATES: RangeInclusive<u32> = 0xD800..=0xDFFF;

/// Masking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Key code of the password hotkey
    pub hotkey_code: u32,
    /// Typed prefix trigger
    pub prefix: String,
    /// Minimum password length, not counting the prefix
    pub min_password_len: usize,
    /// First mask code
    pub mask_base: char,
    /// Last mask code (inclusive)
    pub mask_ceiling: char,
    /// Key codes whose keydown/keyup are hidden from the page
    pub concealed_keys: RangeInclusive<u32>,
    /// Refuse to finalize on script-dispatched blur/submit
    pub reject_untrusted_finalize: bool,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            hotkey_code: DEFAULT_HOTKEY_CODE,
            prefix: DEFAULT_PREFIX.to_string(),
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            mask_base: DEFAULT_MASK_BASE,
            mask_ceiling: DEFAULT_MASK_CEILING,
            concealed_keys: DEFAULT_CONCEALED_KEYS,
            reject_untrusted_finalize: true,
        }
    }
}

impl MaskConfig {
    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptyPrefix` if `prefix` is empty
    /// - `ConfigError::ZeroMinimumLength` if `min_password_len` is 0
    /// - `ConfigError::InvertedMaskRange` if `mask_base > mask_ceiling`
    /// - `ConfigError::SurrogateMaskRange` if the mask range crosses the
    ///   surrogate block
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        if self.min_password_len == 0 {
            return Err(ConfigError::ZeroMinimumLength);
        }

        let (base, ceiling) = (self.mask_base, self.mask_ceiling);
        if base > ceiling {
            return Err(ConfigError::InvertedMaskRange { base, ceiling });
        }

        if (base as u32) < *SURROGATES.start() && (ceiling as u32) > *SURROGATES.end() {
            return Err(ConfigError::SurrogateMaskRange { base, ceiling });
        }

        Ok(())
    }

    /// Number of keystrokes a single session can mask.
    pub fn mask_capacity(&self) -> usize {
        (self.mask_ceiling as u32).saturating_sub(self.mask_base as u32) as usize + 1
    }

    /// Whether keydown/keyup with this key code must be hidden from the page.
    pub fn conceals(&self, key_code: u32) -> bool {
        self.concealed_keys.contains(&key_code)
    }

    /// Prefix length in characters.
    pub fn prefix_len(&self) -> usize {
        self.prefix.chars().count()
    }
}
