//! Mask-code table.
//!
//! Each real keystroke is given the next unused code from a fixed range and
//! the page only ever sees that code. Codes are never reused within a session,
//! so repeated characters in the password do not show up as repeated mask
//! characters.
//!
//! # Invariants
//!
//! - Codes are assigned strictly increasing from `base`
//! - `base <= next_code() <= ceiling + 1`
//! - An entry, once written, is never removed or overwritten
//! - `len() <= capacity()`; assigning into a full map fails

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::{config::MaskConfig, error::KeyMapFull};

/// Fixed-capacity mapping from mask code to the original character.
#[derive(Clone)]
pub struct KeyMap {
    base: u32,
    capacity: usize,
    /// `originals[i]` is the character behind mask code `base + i`.
    originals: Vec<char>,
}

// Never print the originals
impl fmt::Debug for KeyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMap")
            .field("base", &self.base)
            .field("capacity", &self.capacity)
            .field("len", &self.originals.len())
            .finish()
    }
}

impl Drop for KeyMap {
    fn drop(&mut self) {
        self.originals.zeroize();
    }
}

impl KeyMap {
    /// Empty map over `base..=ceiling`.
    ///
    /// The range must not span surrogates; see [`MaskConfig::validate`].
    pub fn new(base: char, ceiling: char) -> Self {
        let capacity = (ceiling as u32).saturating_sub(base as u32) as usize + 1;
        Self { base: base as u32, capacity, originals: Vec::with_capacity(capacity) }
    }

    /// Empty map over the configured mask range.
    pub fn from_config(config: &MaskConfig) -> Self {
        Self::new(config.mask_base, config.mask_ceiling)
    }

    /// Record `original` and return the mask character standing in for it.
    ///
    /// # Errors
    ///
    /// - `KeyMapFull` if every code in the range is taken
    pub fn assign(&mut self, original: char) -> Result<char, KeyMapFull> {
        if self.is_full() {
            return Err(KeyMapFull { capacity: self.capacity });
        }

        let Some(mask) = char::from_u32(self.next_code()) else {
            return Err(KeyMapFull { capacity: self.capacity });
        };

        self.originals.push(original);
        debug_assert!(self.next_code() <= self.base + self.capacity as u32);

        Ok(mask)
    }

    /// Original character behind `mask`. `None` if `mask` was never assigned.
    pub fn lookup(&self, mask: char) -> Option<char> {
        let index = (mask as u32).checked_sub(self.base)? as usize;
        self.originals.get(index).copied()
    }

    /// Translate a masked string back to what the user typed.
    ///
    /// Characters with no entry (pasted text, the plain prefix) pass through
    /// unchanged, so the output always has as many characters as the input.
    pub fn reveal(&self, masked: &str) -> Zeroizing<String> {
        let mut password = Zeroizing::new(String::with_capacity(masked.len()));
        for ch in masked.chars() {
            password.push(self.lookup(ch).unwrap_or(ch));
        }
        password
    }

    /// Next code to hand out.
    pub fn next_code(&self) -> u32 {
        self.base + self.originals.len() as u32
    }

    /// First code in the range.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Number of keystrokes masked so far.
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    /// No keystroke masked yet.
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Size of the mask-code range.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every code handed out.
    pub fn is_full(&self) -> bool {
        self.originals.len() >= self.capacity
    }
}
