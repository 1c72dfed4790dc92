//! Process-wide lifecycle owner.
//!
//! The [`Controller`] is the explicit context a host creates once per page
//! lifetime. It owns the trigger monitor (and through it the session), the
//! post-finalize tripwires, and the user-notification collaborators.
//!
//! Dispatch order for every captured event:
//!
//! 1. Armed tripwires, so a finalized field is wiped before anything else
//!    reacts to the keystroke
//! 2. Trigger monitor, which forwards to the session
//! 3. Action post-processing: warnings are shown and stripped, lockdown
//!    actions update the tripwire registry
//!
//! The host applies the returned actions in order.

use tracing::{debug, info};

use crate::{
    action::Action,
    config::MaskConfig,
    error::ConfigError,
    event::PageEvent,
    lockdown::Lockdowns,
    messages::{Localizer, Notifier, Warning},
    monitor::TriggerMonitor,
    page::{ElementId, Page},
    services::{DomainExtractor, PasswordHasher},
};

/// Explicit replacement for a module-level singleton.
#[derive(Debug)]
pub struct Controller<L, N> {
    monitor: TriggerMonitor,
    lockdowns: Lockdowns,
    localizer: L,
    notifier: N,
}

impl<L: Localizer, N: Notifier> Controller<L, N> {
    /// Validate `config` and create the monitor.
    ///
    /// # Errors
    ///
    /// - `ConfigError` if the configuration is unusable
    pub fn new(config: MaskConfig, localizer: L, notifier: N) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            hotkey = config.hotkey_code,
            prefix_len = config.prefix_len(),
            capacity = config.mask_capacity(),
            "keymask controller started"
        );

        Ok(Self {
            monitor: TriggerMonitor::new(config),
            lockdowns: Lockdowns::new(),
            localizer,
            notifier,
        })
    }

    /// Process one captured event.
    ///
    /// Flags on `event` are updated in place. The returned actions never
    /// contain [`Action::Warn`]; warnings have already been shown.
    pub fn dispatch<P, H, X>(
        &mut self,
        event: &mut PageEvent,
        page: &P,
        hasher: &H,
        domains: &X,
    ) -> Vec<Action>
    where
        P: Page + ?Sized,
        H: PasswordHasher + ?Sized,
        X: DomainExtractor + ?Sized,
    {
        let mut actions = self.lockdowns.intercept(event);
        actions.extend(self.monitor.dispatch(event, page, hasher, domains));
        self.settle(actions)
    }

    /// Show `message` to the user. Blocks until acknowledged.
    pub fn warn_user(&self, message: &str) {
        self.notifier.warn_user(message);
    }

    /// Trigger monitor.
    pub fn monitor(&self) -> &TriggerMonitor {
        &self.monitor
    }

    /// Tripwire registry.
    pub fn lockdowns(&self) -> &Lockdowns {
        &self.lockdowns
    }

    /// Whether `field` holds a derived password guarded by a tripwire.
    pub fn is_locked_down(&self, field: ElementId) -> bool {
        self.lockdowns.is_armed(field)
    }

    /// Active configuration.
    pub fn config(&self) -> &MaskConfig {
        self.monitor.config()
    }

    /// Notification sink.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn settle(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut settled = Vec::with_capacity(actions.len());

        for action in actions {
            match action {
                Action::Warn(warning) => self.warn(warning),
                Action::Attach { field } => {
                    // Stale derived value goes now, not on the session's first key
                    settled.extend(self.lockdowns.fire(field));
                    settled.push(action);
                },
                Action::ArmLockdown { field } => {
                    self.lockdowns.arm(field);
                    settled.push(action);
                },
                other => settled.push(other),
            }
        }

        settled
    }

    fn warn(&self, warning: Warning) {
        debug!(key = warning.message_key(), "warning user");
        self.warn_user(&self.localizer.get_message(warning.message_key()));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        error::AccessError,
        messages::FallbackLocalizer,
        page::{ElementInfo, FrameId},
    };

    const FIELD: ElementId = ElementId(7);
    const HOTKEY: u32 = 113;

    /// One focused password field with a mutable value.
    struct Field {
        value: RefCell<String>,
        present: bool,
    }

    impl Field {
        fn new() -> Self {
            Self { value: RefCell::new(String::new()), present: true }
        }

        fn absent() -> Self {
            Self { value: RefCell::new(String::new()), present: false }
        }

        fn apply(&self, actions: &[Action]) {
            for action in actions {
                match action {
                    Action::ClearValue { .. } => self.value.borrow_mut().clear(),
                    Action::AppendChar { ch, .. } => self.value.borrow_mut().push(*ch),
                    Action::SetValue { value, .. } => *self.value.borrow_mut() = value.clone(),
                    _ => {},
                }
            }
        }
    }

    impl Page for Field {
        fn active_element(&self) -> Option<ElementId> {
            self.present.then_some(FIELD)
        }

        fn element(&self, id: ElementId) -> Result<ElementInfo, AccessError> {
            if self.present && id == FIELD {
                Ok(ElementInfo::input("password"))
            } else {
                Err(AccessError::Element { element: id, reason: "missing".to_string() })
            }
        }

        fn root_frame(&self) -> FrameId {
            FrameId(0)
        }

        fn frame_inputs(&self, _frame: FrameId) -> Result<Vec<ElementId>, AccessError> {
            Ok(if self.present { vec![FIELD] } else { vec![] })
        }

        fn child_frames(&self, _frame: FrameId) -> Result<Vec<FrameId>, AccessError> {
            Ok(vec![])
        }

        fn value(&self, _field: ElementId) -> String {
            self.value.borrow().clone()
        }

        fn form_of(&self, _field: ElementId) -> Option<ElementId> {
            None
        }

        fn document_uri(&self, _field: ElementId) -> String {
            "https://example.org/".to_string()
        }
    }

    struct Upper;

    impl PasswordHasher for Upper {
        fn derive(&self, password: &str, domain: &str) -> String {
            format!("{}@{domain}", password.to_uppercase())
        }
    }

    impl DomainExtractor for Upper {
        fn extract_domain(&self, _uri: &str) -> String {
            "example.org".to_string()
        }
    }

    #[derive(Default)]
    struct Inbox {
        seen: RefCell<Vec<String>>,
    }

    impl Notifier for &Inbox {
        fn warn_user(&self, message: &str) {
            self.seen.borrow_mut().push(message.to_string());
        }
    }

    fn controller(inbox: &Inbox) -> Controller<FallbackLocalizer, &Inbox> {
        Controller::new(MaskConfig::default(), FallbackLocalizer, inbox).unwrap()
    }

    fn step(
        controller: &mut Controller<FallbackLocalizer, &Inbox>,
        page: &Field,
        mut event: PageEvent,
    ) -> Vec<Action> {
        let actions = controller.dispatch(&mut event, page, &Upper, &Upper);
        page.apply(&actions);
        actions
    }

    #[test]
    fn invalid_config_is_refused() {
        let inbox = Inbox::default();
        let config = MaskConfig { prefix: String::new(), ..MaskConfig::default() };
        assert_eq!(
            Controller::new(config, FallbackLocalizer, &inbox).err(),
            Some(ConfigError::EmptyPrefix)
        );
    }

    #[test]
    fn warnings_are_shown_and_stripped() {
        let inbox = Inbox::default();
        let mut controller = controller(&inbox);
        let page = Field::absent();

        let actions = step(&mut controller, &page, PageEvent::key_down(ElementId(1), HOTKEY));

        assert!(actions.is_empty());
        assert_eq!(*inbox.seen.borrow(), vec![Warning::NoPasswordField.fallback_text().to_string()]);
    }

    #[test]
    fn full_cycle_arms_lockdown_then_trips() {
        let inbox = Inbox::default();
        let mut controller = controller(&inbox);
        let page = Field::new();

        step(&mut controller, &page, PageEvent::key_down(FIELD, HOTKEY));
        for ch in "secret".chars() {
            step(&mut controller, &page, PageEvent::key_press(FIELD, ch));
        }
        assert_eq!(page.value(FIELD), "ABCDEF");

        let actions = step(&mut controller, &page, PageEvent::blur(FIELD));
        assert!(actions.contains(&Action::ArmLockdown { field: FIELD }));
        assert_eq!(page.value(FIELD), "SECRET@example.org");
        assert!(controller.is_locked_down(FIELD));
        assert!(controller.monitor().session().is_none());

        let actions = step(&mut controller, &page, PageEvent::focus(FIELD));
        assert_eq!(actions, vec![Action::ClearValue { field: FIELD }, Action::ReleaseLockdown {
            field: FIELD
        }]);
        assert_eq!(page.value(FIELD), "");
        assert!(!controller.is_locked_down(FIELD));
        assert!(inbox.seen.borrow().is_empty());
    }

    #[test]
    fn hotkey_on_locked_field_fires_tripwire_once() {
        let inbox = Inbox::default();
        let mut controller = controller(&inbox);
        let page = Field::new();

        step(&mut controller, &page, PageEvent::key_down(FIELD, HOTKEY));
        for ch in "secret".chars() {
            step(&mut controller, &page, PageEvent::key_press(FIELD, ch));
        }
        step(&mut controller, &page, PageEvent::blur(FIELD));

        // The tripwire fires on this keydown before the new session attaches
        let actions = step(&mut controller, &page, PageEvent::key_down(FIELD, HOTKEY));
        assert_eq!(actions[0], Action::ClearValue { field: FIELD });
        assert!(actions.contains(&Action::Attach { field: FIELD }));
        assert!(!controller.is_locked_down(FIELD));

        // And keystrokes in the new session are not wiped
        step(&mut controller, &page, PageEvent::key_down(FIELD, u32::from(b'A')));
        step(&mut controller, &page, PageEvent::key_press(FIELD, 'a'));
        assert_eq!(page.value(FIELD), "A");
    }

    #[test]
    fn short_password_warns_through_localizer() {
        let inbox = Inbox::default();
        let mut controller = controller(&inbox);
        let page = Field::new();

        step(&mut controller, &page, PageEvent::key_down(FIELD, HOTKEY));
        for ch in "abc".chars() {
            step(&mut controller, &page, PageEvent::key_press(FIELD, ch));
        }
        step(&mut controller, &page, PageEvent::blur(FIELD));

        assert_eq!(*inbox.seen.borrow(), vec![
            Warning::PasswordTooShort.fallback_text().to_string()
        ]);
        assert_eq!(page.value(FIELD), "");
        assert!(!controller.is_locked_down(FIELD));
    }
}
