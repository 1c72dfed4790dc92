//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the controller and page state at a point in time.
//! Invariants operate on snapshots rather than live state so every check in
//! one pass sees the same world.

use keymask_core::{ElementId, MonitorState, SessionState};

/// Snapshot of controller and page state after one simulated step.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Trigger monitor state.
    pub monitor_state: MonitorState,
    /// Live session, if any.
    pub session: Option<SessionSnapshot>,
    /// Fields the page has session listeners on.
    pub attached: Vec<ElementId>,
    /// Fields carrying the secure marker.
    pub secure: Vec<ElementId>,
    /// Fields the page has lockdown listeners on.
    pub page_lockdowns: Vec<ElementId>,
    /// Fields the controller holds an armed tripwire for.
    pub armed: Vec<ElementId>,
    /// Listener misuse recorded by the page.
    pub listener_errors: Vec<String>,
}

impl SystemSnapshot {
    /// Idle controller on an untouched page.
    pub fn idle() -> Self {
        Self {
            monitor_state: MonitorState::Idle,
            session: None,
            attached: Vec::new(),
            secure: Vec::new(),
            page_lockdowns: Vec::new(),
            armed: Vec::new(),
            listener_errors: Vec::new(),
        }
    }
}

/// Snapshot of the live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Protected field.
    pub field: ElementId,
    /// Session state.
    pub state: SessionState,
    /// Keystrokes masked so far.
    pub masked: usize,
    /// First mask code.
    pub base: u32,
    /// Next mask code.
    pub next_code: u32,
    /// Size of the mask range.
    pub capacity: usize,
}
