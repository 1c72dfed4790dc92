//! Protection session state machine.
//!
//! Owns one password field from the moment a trigger fires until the field
//! loses focus, its form is submitted, or something looks wrong. While active,
//! every character typed into the field is swallowed and replaced by a mask
//! character; on finalize the masked value is translated back, hashed with the
//! page's domain, and the derived password is written into the field.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  keydown/keyup/keypress/focus   ┌────────┐
//! │ Active │────────────────────────────────>│ Active │
//! └────────┘                                 └────────┘
//!     │ blur/submit    ┌────────────┐  hashed or rejected  ┌──────────┐
//!     └───────────────>│ Finalizing │─────────────────────>│ Disabled │
//!                      └────────────┘                      └──────────┘
//!     │ unexpected origin / mask space exhausted / untrusted finalize  ↑
//!     └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Disabled` is terminal. Leaving `Active` always emits exactly one
//! [`Action::Detach`].

use tracing::{debug, info, warn};

use crate::{
    action::Action,
    config::MaskConfig,
    event::{EventKind, PageEvent},
    keymap::KeyMap,
    messages::Warning,
    page::{ElementId, Page},
    services::{DomainExtractor, PasswordHasher},
};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Intercepting and masking keystrokes
    Active,
    /// Listeners detached, reconstructing and hashing
    Finalizing,
    /// Terminal; never touches the field again
    Disabled,
}

/// Protection state bound to one password field.
#[derive(Debug, Clone)]
pub struct ProtectionSession {
    field: ElementId,
    key_map: KeyMap,
    state: SessionState,
    config: MaskConfig,
}

impl ProtectionSession {
    /// Start protecting `field`.
    ///
    /// Returns the session and the actions that mark the field and attach the
    /// session's listeners.
    pub fn start(field: ElementId, config: &MaskConfig) -> (Self, Vec<Action>) {
        let session = Self {
            field,
            key_map: KeyMap::from_config(config),
            state: SessionState::Active,
            config: config.clone(),
        };

        info!(%field, "protecting password field");
        (session, vec![Action::SetSecureMarker { field }, Action::Attach { field }])
    }

    /// Field under protection.
    pub fn field(&self) -> ElementId {
        self.field
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Reached the terminal state.
    pub fn is_disabled(&self) -> bool {
        self.state == SessionState::Disabled
    }

    /// Mask-code table.
    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    /// Whether the session's listeners would receive `event`.
    ///
    /// Listeners sit on the field itself; submit events fire on the owning
    /// form.
    pub fn listens_to<P: Page + ?Sized>(&self, event: &PageEvent, page: &P) -> bool {
        if self.state != SessionState::Active {
            return false;
        }

        event.target() == self.field
            || (event.kind() == EventKind::Submit && page.form_of(self.field) == Some(event.target()))
    }

    /// Process an event delivered to the field's listeners.
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
        if self.state != SessionState::Active {
            return vec![];
        }

        if !event.flags().hotkey && !self.owns(event.original_target(), page) {
            // Some other context is feeding us events; stop rather than guess
            warn!(
                kind = event.kind().as_str(),
                origin = %event.original_target(),
                field = %self.field,
                "unexpected event origin, disabling session"
            );
            return self.disable();
        }

        if event.is_marked() {
            return vec![];
        }

        match event.kind() {
            EventKind::KeyDown | EventKind::KeyUp => {
                if self.config.conceals(event.key_code()) {
                    event.stop_propagation();
                }
                vec![]
            },
            EventKind::KeyPress => self.mask_keystroke(event),
            EventKind::Blur | EventKind::Submit => {
                if !event.is_trusted() && self.config.reject_untrusted_finalize {
                    return self.reject_untrusted(event.kind());
                }
                self.finalize(page, hasher, domains)
            },
            EventKind::Focus => vec![],
        }
    }

    /// Swallow a keypress and append its mask instead.
    fn mask_keystroke(&mut self, event: &mut PageEvent) -> Vec<Action> {
        event.stop_propagation();

        // Non-printing keys (backspace, arrows) keep their default action
        let Some(original) = event.character() else {
            return vec![];
        };

        event.prevent_default();

        match self.key_map.assign(original) {
            Ok(mask) => vec![Action::AppendChar { field: self.field, ch: mask }],
            Err(full) => {
                warn!(field = %self.field, capacity = full.capacity, "mask space exhausted");
                let mut actions = vec![Action::Warn(Warning::PasswordTooLong)];
                actions.extend(self.disable());
                actions
            },
        }
    }

    /// Reconstruct, hash, and write back the password.
    ///
    /// Runs at most once; later calls (and calls on a disabled session) do
    /// nothing.
    pub fn finalize<P, H, X>(&mut self, page: &P, hasher: &H, domains: &X) -> Vec<Action>
    where
        P: Page + ?Sized,
        H: PasswordHasher + ?Sized,
        X: DomainExtractor + ?Sized,
    {
        if self.state != SessionState::Active {
            return vec![];
        }

        let mut actions = self.leave(SessionState::Finalizing);
        let field = self.field;
        let masked = page.value(field);

        if masked.is_empty() {
            debug!(%field, "field left empty");
            actions.push(Action::ClearSecureMarker { field });
            self.state = SessionState::Disabled;
            return actions;
        }

        let body = masked.strip_prefix(self.config.prefix.as_str()).unwrap_or(masked.as_str());

        // One mask character per keystroke, so this is the real length
        let length = body.chars().count();
        if length < self.config.min_password_len {
            debug!(%field, length, minimum = self.config.min_password_len, "password too short");
            actions.push(Action::Warn(Warning::PasswordTooShort));
            actions.push(Action::ClearValue { field });
            self.state = SessionState::Disabled;
            return actions;
        }

        let domain = domains.extract_domain(&page.document_uri(field));
        let derived = {
            let password = self.key_map.reveal(body);
            hasher.derive(&password, &domain)
        };

        info!(%field, length, domain = %domain, "wrote derived password");
        actions.push(Action::SetValue { field, value: derived });
        actions.push(Action::ArmLockdown { field });
        self.state = SessionState::Disabled;
        actions
    }

    /// Detach and stop. Idempotent.
    pub fn disable(&mut self) -> Vec<Action> {
        if self.state != SessionState::Active {
            return vec![];
        }
        let actions = self.leave(SessionState::Disabled);
        debug!(field = %self.field, "session disabled");
        actions
    }

    fn reject_untrusted(&mut self, kind: EventKind) -> Vec<Action> {
        warn!(field = %self.field, kind = kind.as_str(), "untrusted finalize trigger");
        let mut actions = self.disable();
        actions.push(Action::ClearValue { field: self.field });
        actions.push(Action::ClearSecureMarker { field: self.field });
        actions.push(Action::Warn(Warning::UntrustedEvent));
        actions
    }

    fn leave(&mut self, next: SessionState) -> Vec<Action> {
        debug_assert_eq!(self.state, SessionState::Active);
        self.state = next;
        vec![Action::Detach { field: self.field }]
    }

    fn owns<P: Page + ?Sized>(&self, origin: ElementId, page: &P) -> bool {
        origin == self.field || page.form_of(self.field) == Some(origin)
    }
}
