//! Simulation driver.
//!
//! `SimDriver` plays the browser: it routes every event through the
//! controller in the capturing phase, applies the returned actions to the
//! [`SimPage`], lets page-level listeners observe whatever was not stopped,
//! and performs the default character insertion for keypresses that were not
//! prevented. Focus changes caused by actions are queued and dispatched in
//! turn, so one user gesture may run several events.
//!
//! With invariants enabled, the registry is checked after every dispatched
//! event.

use std::collections::VecDeque;

use keymask_core::{
    ConfigError, Controller, ElementId, EventKind, MaskConfig, Page, PageEvent, Warning,
};
use tracing::debug;

use crate::{
    invariants::{InvariantRegistry, SessionSnapshot, SystemSnapshot},
    sim_page::SimPage,
    sim_services::{SimLocalizer, SimNotifier, SimServices},
};

/// What a page-level listener saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
    /// Event type
    pub kind: EventKind,
    /// Element the event fired on
    pub target: ElementId,
    /// Key code
    pub key_code: u32,
    /// Character, for keypresses
    pub character: Option<char>,
}

impl From<&PageEvent> for ObservedEvent {
    fn from(event: &PageEvent) -> Self {
        Self {
            kind: event.kind(),
            target: event.target(),
            key_code: event.key_code(),
            character: event.character(),
        }
    }
}

/// Key code a US keyboard reports for `ch`. 0 for keys we do not model.
pub fn key_code_for(ch: char) -> u32 {
    match ch {
        'a'..='z' | 'A'..='Z' | '0'..='9' | ' ' => u32::from(ch.to_ascii_uppercase()),
        _ => 0,
    }
}

/// Browser stand-in driving one controller against one page.
pub struct SimDriver {
    controller: Controller<SimLocalizer, SimNotifier>,
    page: SimPage,
    services: SimServices,
    pending: VecDeque<PageEvent>,
    observed: Vec<ObservedEvent>,
    invariants: Option<InvariantRegistry>,
    dispatched: usize,
}

impl SimDriver {
    /// Driver with the default configuration.
    #[allow(clippy::expect_used, reason = "default configuration always validates")]
    pub fn new(page: SimPage) -> Self {
        Self::with_config(page, MaskConfig::default()).expect("default config is valid")
    }

    /// Driver with a custom configuration.
    pub fn with_config(page: SimPage, config: MaskConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: Controller::new(config, SimLocalizer, SimNotifier::new())?,
            page,
            services: SimServices::new(),
            pending: VecDeque::new(),
            observed: Vec::new(),
            invariants: None,
            dispatched: 0,
        })
    }

    /// Enable invariant checking after every event.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Dispatch `event` and everything it causes.
    pub fn dispatch(&mut self, event: PageEvent) {
        self.pending.push_back(event);
        self.run();
    }

    /// Press and release a non-character key on the focused element.
    pub fn press_key(&mut self, key_code: u32) {
        let target = self.page.key_target();
        self.dispatch(PageEvent::key_down(target, key_code));
        // Focus may have moved while handling keydown
        let target = self.page.key_target();
        self.dispatch(PageEvent::key_up(target, key_code));
    }

    /// Press the configured hotkey.
    pub fn press_hotkey(&mut self) {
        self.press_key(self.controller.config().hotkey_code);
    }

    /// Type one character on the focused element.
    pub fn type_char(&mut self, ch: char) {
        let code = key_code_for(ch);
        let target = self.page.key_target();
        self.dispatch(PageEvent::key_down(target, code));
        let target = self.page.key_target();
        self.dispatch(PageEvent::key_press(target, ch).with_key_code(code));
        let target = self.page.key_target();
        self.dispatch(PageEvent::key_up(target, code));
    }

    /// Type every character of `text`.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.type_char(ch);
        }
    }

    /// Give `target` focus.
    pub fn focus(&mut self, target: ElementId) {
        let events = self.page.move_focus(Some(target));
        self.pending.extend(events);
        self.run();
    }

    /// Move focus away from everything.
    pub fn blur(&mut self) {
        let events = self.page.move_focus(None);
        self.pending.extend(events);
        self.run();
    }

    /// Submit the form owning the focused element. No-op outside a form.
    pub fn submit(&mut self) {
        if let Some(form) = self.page.focused().and_then(|field| self.page.form(field)) {
            self.dispatch(PageEvent::submit(form));
        }
    }

    /// Fire a script-made `blur` at the focused element without moving focus.
    pub fn untrusted_blur(&mut self) {
        if let Some(field) = self.page.focused() {
            self.dispatch(PageEvent::blur(field).untrusted());
        }
    }

    /// Append `text` to the focused field without any key events.
    pub fn paste(&mut self, text: &str) {
        if let Some(field) = self.page.focused() {
            let value = self.page.value(field) + text;
            self.page.set_value(field, &value);
        }
    }

    fn run(&mut self) {
        while let Some(mut event) = self.pending.pop_front() {
            let actions =
                self.controller.dispatch(&mut event, &self.page, &self.services, &self.services);

            for action in &actions {
                let follow_up = self.page.apply(action);
                self.pending.extend(follow_up);
            }

            let flags = event.flags();
            if !flags.propagation_stopped {
                self.observed.push(ObservedEvent::from(&event));
            }

            if event.kind() == EventKind::KeyPress
                && !flags.default_prevented
                && let Some(ch) = event.character()
            {
                self.page.insert_char(event.target(), ch);
            }

            self.dispatched += 1;
            debug!(
                step = self.dispatched,
                kind = event.kind().as_str(),
                target = %event.target(),
                actions = actions.len(),
                "dispatched"
            );
            self.check_invariants(&event);
        }
    }

    fn check_invariants(&self, event: &PageEvent) {
        if let Some(registry) = &self.invariants {
            let context = format!(
                "after step {} ({} on {})",
                self.dispatched,
                event.kind().as_str(),
                event.target()
            );
            registry.assert_all(&self.snapshot(), &context);
        }
    }

    /// Observable state right now.
    pub fn snapshot(&self) -> SystemSnapshot {
        let monitor = self.controller.monitor();
        SystemSnapshot {
            monitor_state: monitor.state(),
            session: monitor.session().map(|session| SessionSnapshot {
                field: session.field(),
                state: session.state(),
                masked: session.key_map().len(),
                base: session.key_map().base(),
                next_code: session.key_map().next_code(),
                capacity: session.key_map().capacity(),
            }),
            attached: self.page.attached_fields(),
            secure: self.page.secure_fields(),
            page_lockdowns: self.page.lockdown_fields(),
            armed: self.controller.lockdowns().fields().collect(),
            listener_errors: self.page.listener_errors().to_vec(),
        }
    }

    /// The page.
    pub fn page(&self) -> &SimPage {
        &self.page
    }

    /// The page, for scripted changes between gestures.
    pub fn page_mut(&mut self) -> &mut SimPage {
        &mut self.page
    }

    /// The controller.
    pub fn controller(&self) -> &Controller<SimLocalizer, SimNotifier> {
        &self.controller
    }

    /// Hasher and domain extractor.
    pub fn services(&self) -> &SimServices {
        &self.services
    }

    /// Current value of `field`.
    pub fn value(&self, field: ElementId) -> String {
        self.page.value(field)
    }

    /// Events page-level listeners received, oldest first.
    pub fn observed(&self) -> &[ObservedEvent] {
        &self.observed
    }

    /// Characters page-level listeners received through keypress events.
    pub fn observed_text(&self) -> String {
        self.observed
            .iter()
            .filter(|event| event.kind == EventKind::KeyPress)
            .filter_map(|event| event.character)
            .collect()
    }

    /// Warnings shown to the user, as message keys.
    pub fn warnings(&self) -> Vec<Warning> {
        self.controller
            .notifier()
            .shown()
            .iter()
            .filter_map(|key| Warning::from_message_key(key))
            .collect()
    }

    /// Number of events dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}
