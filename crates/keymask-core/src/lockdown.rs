//! Post-finalize lockdown.
//!
//! Once a derived password has been written into a field, appending to it or
//! editing it in place would silently produce a credential that no longer
//! matches what the site expects. A [`Tripwire`] wipes the field on the next
//! keydown or focus and removes itself. It lives outside the session, so it
//! keeps working after the session object is gone.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    action::Action,
    event::{EventKind, PageEvent},
    page::ElementId,
};

/// Single-fire subscription on one finalized field.
///
/// Fires at most once; a fired tripwire produces no further actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tripwire {
    field: ElementId,
    armed: bool,
}

impl Tripwire {
    /// Armed tripwire on `field`.
    pub fn arm(field: ElementId) -> Self {
        Self { field, armed: true }
    }

    /// Field being guarded.
    pub fn field(&self) -> ElementId {
        self.field
    }

    /// Still waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether `event` sets this tripwire off.
    pub fn trips_on(&self, event: &PageEvent) -> bool {
        self.armed
            && event.target() == self.field
            && matches!(event.kind(), EventKind::KeyDown | EventKind::Focus)
    }

    /// Clear the field and remove the listeners.
    pub fn fire(&mut self) -> Vec<Action> {
        if !self.armed {
            return vec![];
        }
        self.armed = false;
        vec![Action::ClearValue { field: self.field }, Action::ReleaseLockdown { field: self.field }]
    }
}

/// Armed tripwires, at most one per field.
#[derive(Debug, Clone, Default)]
pub struct Lockdowns {
    tripwires: HashMap<ElementId, Tripwire>,
}

impl Lockdowns {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a tripwire on `field`. Re-arming an armed field is a no-op.
    pub fn arm(&mut self, field: ElementId) {
        debug!(%field, "lockdown armed");
        self.tripwires.entry(field).or_insert_with(|| Tripwire::arm(field));
    }

    /// Fire the tripwire `event` sets off, if any.
    pub fn intercept(&mut self, event: &PageEvent) -> Vec<Action> {
        let field = event.target();
        let Some(tripwire) = self.tripwires.get_mut(&field) else {
            return vec![];
        };

        if !tripwire.trips_on(event) {
            return vec![];
        }

        debug!(%field, kind = event.kind().as_str(), "lockdown tripped");
        let actions = tripwire.fire();
        self.tripwires.remove(&field);
        actions
    }

    /// Fire the tripwire on `field` now, whatever the event.
    ///
    /// Used when a new session claims the field: the stale derived value goes
    /// before the session's first keystroke can land.
    pub fn fire(&mut self, field: ElementId) -> Vec<Action> {
        let Some(mut tripwire) = self.tripwires.remove(&field) else {
            return vec![];
        };
        debug!(%field, "lockdown fired by new session");
        tripwire.fire()
    }

    /// Whether `field` has an armed tripwire.
    pub fn is_armed(&self, field: ElementId) -> bool {
        self.tripwires.get(&field).is_some_and(Tripwire::is_armed)
    }

    /// Fields with an armed tripwire, in no particular order.
    pub fn fields(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.tripwires.keys().copied()
    }

    /// Number of armed tripwires.
    pub fn len(&self) -> usize {
        self.tripwires.len()
    }

    /// No armed tripwires.
    pub fn is_empty(&self) -> bool {
        self.tripwires.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: ElementId = ElementId(1);

    #[test]
    fn fires_once_on_keydown() {
        let mut lockdowns = Lockdowns::new();
        lockdowns.arm(FIELD);

        let actions = lockdowns.intercept(&PageEvent::key_down(FIELD, 65));
        assert_eq!(actions, vec![Action::ClearValue { field: FIELD }, Action::ReleaseLockdown {
            field: FIELD
        }]);

        assert!(lockdowns.intercept(&PageEvent::key_down(FIELD, 65)).is_empty());
        assert!(!lockdowns.is_armed(FIELD));
    }

    #[test]
    fn fires_on_focus() {
        let mut lockdowns = Lockdowns::new();
        lockdowns.arm(FIELD);
        assert_eq!(lockdowns.intercept(&PageEvent::focus(FIELD)).len(), 2);
    }

    #[test]
    fn ignores_other_events_and_fields() {
        let mut lockdowns = Lockdowns::new();
        lockdowns.arm(FIELD);

        assert!(lockdowns.intercept(&PageEvent::key_up(FIELD, 65)).is_empty());
        assert!(lockdowns.intercept(&PageEvent::key_press(FIELD, 'a')).is_empty());
        assert!(lockdowns.intercept(&PageEvent::blur(FIELD)).is_empty());
        assert!(lockdowns.intercept(&PageEvent::key_down(ElementId(2), 65)).is_empty());
        assert!(lockdowns.is_armed(FIELD));
    }

    #[test]
    fn fire_clears_and_is_single_shot() {
        let mut lockdowns = Lockdowns::new();
        lockdowns.arm(FIELD);

        let actions = lockdowns.fire(FIELD);
        assert_eq!(actions, vec![Action::ClearValue { field: FIELD }, Action::ReleaseLockdown {
            field: FIELD
        }]);
        assert!(lockdowns.fire(FIELD).is_empty());
        assert!(lockdowns.intercept(&PageEvent::focus(FIELD)).is_empty());
        assert!(lockdowns.is_empty());
    }

    #[test]
    fn rearming_keeps_one_tripwire() {
        let mut lockdowns = Lockdowns::new();
        lockdowns.arm(FIELD);
        lockdowns.arm(FIELD);
        lockdowns.arm(ElementId(2));

        assert_eq!(lockdowns.len(), 2);
        let mut fields: Vec<_> = lockdowns.fields().collect();
        fields.sort_unstable();
        assert_eq!(fields, vec![FIELD, ElementId(2)]);
    }

    #[test]
    fn fired_tripwire_never_fires_again() {
        let mut tripwire = Tripwire::arm(FIELD);
        assert_eq!(tripwire.fire().len(), 2);
        assert!(!tripwire.is_armed());
        assert!(!tripwire.trips_on(&PageEvent::focus(FIELD)));
        assert!(tripwire.fire().is_empty());
    }
}
