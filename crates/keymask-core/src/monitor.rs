//! Trigger monitor state machine.
//!
//! Sees every keystroke on the page before page listeners do. Detects the two
//! ways a user signals a master password is coming (the hotkey, or the prefix
//! typed into a focused password field), finds the field, and starts a
//! [`ProtectionSession`] on it. Owns that session and forwards the field's
//! events to it.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ hotkey/prefix ┌───────────────┐  field found  ┌────────────┐
//! │ Idle │──────────────>│ AwaitingField │──────────────>│ Protecting │
//! └──────┘               └───────────────┘               └────────────┘
//!    ↑                          │ no field / mismatch          │
//!    └──────────────────────────┴──────────────────────────────┘
//!                                      session disabled
//! ```
//!
//! At most one session exists. A hotkey press while protecting clears the
//! field and keeps the current session.

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    action::Action,
    config::MaskConfig,
    event::{EventKind, PageEvent},
    frames::{find_password_field, is_password_input},
    messages::Warning,
    page::{ElementId, Page},
    services::{DomainExtractor, PasswordHasher},
    session::ProtectionSession,
};

/// Window entry for a keypress that produces no character.
const NO_CHARACTER: char = '\0';

/// Monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No session
    Idle,
    /// Trigger fired, locating the field
    AwaitingField,
    /// A session owns a field
    Protecting,
}

/// Process-wide keystroke watcher.
#[derive(Debug, Clone)]
pub struct TriggerMonitor {
    config: MaskConfig,
    /// Last typed characters, at most `prefix` long
    recent_keys: VecDeque<char>,
    session: Option<ProtectionSession>,
    state: MonitorState,
}

impl TriggerMonitor {
    /// Idle monitor. `config` is assumed validated.
    pub fn new(config: MaskConfig) -> Self {
        let window = config.prefix_len();
        Self {
            config,
            recent_keys: VecDeque::with_capacity(window + 1),
            session: None,
            state: MonitorState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Active session. `None` if idle.
    pub fn session(&self) -> Option<&ProtectionSession> {
        self.session.as_ref()
    }

    /// Field under protection. `None` if idle.
    pub fn protected_field(&self) -> Option<ElementId> {
        self.session.as_ref().map(ProtectionSession::field)
    }

    /// Active configuration.
    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Process a captured event.
    ///
    /// Trigger detection runs first; the event is then forwarded to the
    /// session if its listeners would see it. A session that ends up disabled
    /// is dropped before returning.
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
        let mut actions = Vec::new();

        if event.key_code() == self.config.hotkey_code && event.kind() == EventKind::KeyDown {
            // Neither page scripts nor the field may see the hotkey
            event.stop_propagation();
            event.prevent_default();
            event.mark_hotkey();
            actions.extend(self.acquire_by_hotkey(page));
        }

        if event.kind() == EventKind::KeyPress {
            // Keys without a character still occupy a slot in the window
            let typed = event.character().unwrap_or(NO_CHARACTER);
            self.remember(typed);
            if self.session.is_none() && self.prefix_typed() {
                event.mark_intercepted();
                actions.extend(self.acquire_by_prefix(page, typed));
            }
        }

        if let Some(session) = self.session.as_mut()
            && session.listens_to(event, page)
        {
            actions.extend(session.dispatch(event, page, hasher, domains));
        }

        self.reap();
        actions
    }

    /// Hotkey path: reuse, focused field, then frame search.
    fn acquire_by_hotkey<P: Page + ?Sized>(&mut self, page: &P) -> Vec<Action> {
        if let Some(session) = &self.session {
            let field = session.field();
            debug!(%field, "hotkey while protecting, clearing field");
            return vec![Action::ClearValue { field }];
        }

        self.state = MonitorState::AwaitingField;

        if let Some(focused) = page.active_element()
            && is_password_input(page, focused)
        {
            let mut actions = vec![Action::ClearValue { field: focused }, Action::Select {
                field: focused,
            }];
            actions.extend(self.protect(focused));
            return actions;
        }

        if let Some(field) = find_password_field(page) {
            let mut actions = vec![Action::Focus { field }];
            actions.extend(self.protect(field));
            return actions;
        }

        debug!("hotkey pressed but no password field found");
        self.state = MonitorState::Idle;
        vec![Action::Warn(Warning::NoPasswordField)]
    }

    /// Prefix path: only the focused field, and only if the prefix is all it
    /// holds.
    fn acquire_by_prefix<P: Page + ?Sized>(&mut self, page: &P, last: char) -> Vec<Action> {
        self.state = MonitorState::AwaitingField;

        if let Some(focused) = page.active_element()
            && is_password_input(page, focused)
        {
            let mut typed = page.value(focused);
            typed.push(last);
            if typed == self.config.prefix {
                return self.protect(focused);
            }
        }

        debug!("prefix typed outside an empty password field");
        self.state = MonitorState::Idle;
        vec![Action::Warn(Warning::PrefixFailed)]
    }

    fn protect(&mut self, field: ElementId) -> Vec<Action> {
        debug_assert!(self.session.is_none(), "second session requested");
        let (session, actions) = ProtectionSession::start(field, &self.config);
        self.session = Some(session);
        self.state = MonitorState::Protecting;
        actions
    }

    fn remember(&mut self, typed: char) {
        self.recent_keys.push_back(typed);
        while self.recent_keys.len() > self.config.prefix_len() {
            self.recent_keys.pop_front();
        }
    }

    fn prefix_typed(&self) -> bool {
        self.recent_keys.iter().copied().eq(self.config.prefix.chars())
    }

    fn reap(&mut self) {
        if self.session.as_ref().is_some_and(ProtectionSession::is_disabled) {
            self.session = None;
            self.state = MonitorState::Idle;
        }
    }
}
