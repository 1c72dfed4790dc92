//! Error types for the keymask core.
//!
//! None of these errors ever escape to the host page. Configuration errors
//! stop the controller from starting; access errors are recovered at the point
//! of access; a full keymap becomes a user warning.

use thiserror::Error;

use crate::page::{ElementId, FrameId};

/// Rejected [`crate::MaskConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Prefix trigger would match on every keystroke
    #[error("password prefix must not be empty")]
    EmptyPrefix,

    /// Minimum length of zero would hash empty passwords
    #[error("minimum password length must be at least 1")]
    ZeroMinimumLength,

    /// Mask range runs backwards
    #[error("mask range is inverted: base {base:?} is above ceiling {ceiling:?}")]
    InvertedMaskRange {
        /// First mask code
        base: char,
        /// Last mask code
        ceiling: char,
    },

    /// Mask range contains code points that are not valid characters
    #[error("mask range {base:?}..={ceiling:?} spans surrogate code points")]
    SurrogateMaskRange {
        /// First mask code
        base: char,
        /// Last mask code
        ceiling: char,
    },
}

/// The host refused to let us inspect part of the page.
///
/// Typically a cross-origin frame. Always treated as "no match here".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Element could not be inspected
    #[error("access to {element} denied: {reason}")]
    Element {
        /// Element that refused inspection
        element: ElementId,
        /// Host-supplied reason
        reason: String,
    },

    /// Frame document could not be inspected
    #[error("access to {frame} denied: {reason}")]
    Frame {
        /// Frame that refused inspection
        frame: FrameId,
        /// Host-supplied reason
        reason: String,
    },
}

/// Every mask code in the configured range has been handed out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("mask-code space exhausted after {capacity} keystrokes")]
pub struct KeyMapFull {
    /// Number of codes in the mask range
    pub capacity: usize,
}
