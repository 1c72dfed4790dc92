//! Standard invariant checks.

use keymask_core::MonitorState;

use super::{Invariant, InvariantResult, SystemSnapshot};

/// At most one session, and it owns the only session listeners.
///
/// A live session means the monitor is protecting and exactly the session's
/// field has listeners. No session means no session listeners anywhere.
pub struct SingletonSession;

impl Invariant for SingletonSession {
    fn name(&self) -> &'static str {
        "SingletonSession"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        match &state.session {
            Some(session) => {
                if state.attached != [session.field] {
                    return Err(self.violation(format!(
                        "session on {} but listeners on {:?}",
                        session.field, state.attached
                    )));
                }
                if state.monitor_state != MonitorState::Protecting {
                    return Err(self.violation(format!(
                        "session on {} while monitor is {:?}",
                        session.field, state.monitor_state
                    )));
                }
            },
            None => {
                if !state.attached.is_empty() {
                    return Err(self.violation(format!(
                        "no session but listeners still on {:?}",
                        state.attached
                    )));
                }
                if state.monitor_state == MonitorState::Protecting {
                    return Err(self.violation("monitor protecting without a session".to_string()));
                }
            },
        }
        Ok(())
    }
}

/// Every listener is added and removed exactly once.
///
/// The page must not have seen a double attach or a stray detach, and the
/// page's lockdown listeners must match the controller's armed tripwires.
pub struct ListenerBalance;

impl Invariant for ListenerBalance {
    fn name(&self) -> &'static str {
        "ListenerBalance"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if let Some(first) = state.listener_errors.first() {
            return Err(self.violation(format!(
                "{} listener error(s), first: {first}",
                state.listener_errors.len()
            )));
        }

        let mut armed = state.armed.clone();
        armed.sort_unstable();
        let mut page = state.page_lockdowns.clone();
        page.sort_unstable();

        if armed != page {
            return Err(self.violation(format!(
                "controller armed {armed:?} but page has lockdown listeners on {page:?}"
            )));
        }
        Ok(())
    }
}

/// The mask cursor never leaves `base..=base + capacity`, and it has advanced
/// exactly once per masked keystroke.
pub struct MaskCursorBounds;

impl Invariant for MaskCursorBounds {
    fn name(&self) -> &'static str {
        "MaskCursorBounds"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(session) = &state.session else {
            return Ok(());
        };

        let ceiling = session.base + session.capacity as u32;
        if session.next_code < session.base || session.next_code > ceiling {
            return Err(self.violation(format!(
                "next code {} outside {}..={}",
                session.next_code, session.base, ceiling
            )));
        }

        if (session.next_code - session.base) as usize != session.masked {
            return Err(self.violation(format!(
                "cursor advanced {} but {} keystrokes masked",
                session.next_code - session.base,
                session.masked
            )));
        }
        Ok(())
    }
}

/// The protected field carries the secure marker.
pub struct SecureMarkerConsistency;

impl Invariant for SecureMarkerConsistency {
    fn name(&self) -> &'static str {
        "SecureMarkerConsistency"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        match &state.session {
            Some(session) if !state.secure.contains(&session.field) => Err(self.violation(
                format!("protected field {} is not marked secure", session.field),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use keymask_core::{ElementId, SessionState};

    use super::*;
    use crate::invariants::SessionSnapshot;

    const FIELD: ElementId = ElementId(3);

    fn protecting() -> SystemSnapshot {
        SystemSnapshot {
            monitor_state: MonitorState::Protecting,
            session: Some(SessionSnapshot {
                field: FIELD,
                state: SessionState::Active,
                masked: 2,
                base: 65,
                next_code: 67,
                capacity: 63,
            }),
            attached: vec![FIELD],
            secure: vec![FIELD],
            ..SystemSnapshot::idle()
        }
    }

    #[test]
    fn healthy_session_passes() {
        let state = protecting();
        assert!(SingletonSession.check(&state).is_ok());
        assert!(ListenerBalance.check(&state).is_ok());
        assert!(MaskCursorBounds.check(&state).is_ok());
        assert!(SecureMarkerConsistency.check(&state).is_ok());
    }

    #[test]
    fn second_attached_field_is_caught() {
        let mut state = protecting();
        state.attached.push(ElementId(9));
        assert!(SingletonSession.check(&state).is_err());
    }

    #[test]
    fn leaked_listeners_after_session_are_caught() {
        let mut state = SystemSnapshot::idle();
        state.attached.push(FIELD);
        assert!(SingletonSession.check(&state).is_err());
    }

    #[test]
    fn lockdown_mismatch_is_caught() {
        let mut state = SystemSnapshot::idle();
        state.armed.push(FIELD);
        assert!(ListenerBalance.check(&state).is_err());

        state.page_lockdowns.push(FIELD);
        assert!(ListenerBalance.check(&state).is_ok());
    }

    #[test]
    fn cursor_drift_is_caught() {
        let mut state = protecting();
        if let Some(session) = state.session.as_mut() {
            session.next_code = 70;
        }
        let violation = MaskCursorBounds.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "MaskCursorBounds");

        if let Some(session) = state.session.as_mut() {
            session.next_code = 200;
            session.masked = 135;
        }
        assert!(MaskCursorBounds.check(&state).is_err());
    }

    #[test]
    fn unmarked_field_is_caught() {
        let mut state = protecting();
        state.secure.clear();
        assert!(SecureMarkerConsistency.check(&state).is_err());
    }
}
