//! Page abstraction.
//!
//! Decouples the state machines from the host DOM. The host implements
//! [`Page`] over the live document (or a simulation), and the core only ever
//! reads through it. Writes are expressed as [`crate::Action`]s.

use std::fmt;

use crate::error::AccessError;

/// Opaque handle to an element in the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Opaque handle to a frame (top-level window or nested frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// What the host reports about an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    /// Tag name as reported by the host (`INPUT`, `FORM`, ...)
    pub tag: String,
    /// `type` attribute for inputs. `None` for other elements.
    pub input_type: Option<String>,
}

impl ElementInfo {
    /// An `<input>` element of the given type.
    pub fn input(input_type: impl Into<String>) -> Self {
        Self { tag: "INPUT".to_string(), input_type: Some(input_type.into()) }
    }

    /// Any non-input element.
    pub fn other(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), input_type: None }
    }

    /// Password-type `<input>`. Tag and type compare case-insensitively.
    pub fn is_password_input(&self) -> bool {
        self.tag.eq_ignore_ascii_case("INPUT")
            && self.input_type.as_deref().is_some_and(|ty| ty.eq_ignore_ascii_case("password"))
    }
}

/// Read-only view of the host page.
///
/// # Invariants
///
/// - `frame_inputs` returns `<input>` elements in document order
/// - `child_frames` returns nested frames in frame-list order
/// - Fallible accessors return `Err` instead of panicking when the host
///   refuses inspection (cross-origin frames, detached nodes)
pub trait Page {
    /// Currently focused element. `None` if nothing has focus.
    fn active_element(&self) -> Option<ElementId>;

    /// Tag and type of an element.
    fn element(&self, id: ElementId) -> Result<ElementInfo, AccessError>;

    /// Top-level frame of the page.
    fn root_frame(&self) -> FrameId;

    /// `<input>` elements of the frame's own document, in document order.
    fn frame_inputs(&self, frame: FrameId) -> Result<Vec<ElementId>, AccessError>;

    /// Frames nested directly inside this frame, in frame-list order.
    fn child_frames(&self, frame: FrameId) -> Result<Vec<FrameId>, AccessError>;

    /// Current value of a field. Empty for unknown elements.
    fn value(&self, field: ElementId) -> String;

    /// Form owning the field. `None` if the field is not in a form.
    fn form_of(&self, field: ElementId) -> Option<ElementId>;

    /// Location of the document owning the field.
    fn document_uri(&self, field: ElementId) -> String;
}
