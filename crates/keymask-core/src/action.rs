//! Page side-effects.
//!
//! This module defines the [`Action`] enum: instructions produced by the state
//! machines for the host to apply to the page, in order, before its event
//! handler returns.

use crate::{messages::Warning, page::ElementId};

/// Actions produced by the state machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Empty the field.
    ClearValue {
        /// Field to clear
        field: ElementId,
    },

    /// Replace the field's value.
    SetValue {
        /// Field to write
        field: ElementId,
        /// New value (the derived password)
        value: String,
    },

    /// Append one character to the field's value.
    AppendChar {
        /// Field to write
        field: ElementId,
        /// Mask character
        ch: char,
    },

    /// Give the field focus.
    Focus {
        /// Field to focus
        field: ElementId,
    },

    /// Select the field's contents.
    Select {
        /// Field to select
        field: ElementId,
    },

    /// Set the "secure" marker attribute.
    SetSecureMarker {
        /// Protected field
        field: ElementId,
    },

    /// Remove the "secure" marker attribute.
    ClearSecureMarker {
        /// Abandoned field
        field: ElementId,
    },

    /// Register the session's capturing listeners (keydown, keyup, keypress,
    /// focus, blur, submit).
    Attach {
        /// Field to listen on
        field: ElementId,
    },

    /// Remove the session's capturing listeners.
    Detach {
        /// Field to stop listening on
        field: ElementId,
    },

    /// Register the post-finalize keydown/focus tripwire.
    ArmLockdown {
        /// Finalized field
        field: ElementId,
    },

    /// Remove the tripwire listeners.
    ReleaseLockdown {
        /// Field whose tripwire is gone
        field: ElementId,
    },

    /// Tell the user something went wrong.
    ///
    /// Consumed by [`crate::Controller`]; never reaches the host.
    Warn(Warning),
}

impl Action {
    /// Field this action touches. `None` for warnings.
    pub fn field(&self) -> Option<ElementId> {
        match self {
            Self::ClearValue { field }
            | Self::SetValue { field, .. }
            | Self::AppendChar { field, .. }
            | Self::Focus { field }
            | Self::Select { field }
            | Self::SetSecureMarker { field }
            | Self::ClearSecureMarker { field }
            | Self::Attach { field }
            | Self::Detach { field }
            | Self::ArmLockdown { field }
            | Self::ReleaseLockdown { field } => Some(*field),
            Self::Warn(_) => None,
        }
    }
}
