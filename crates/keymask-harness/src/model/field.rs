//! Reference model of one password field under protection.
//!
//! Predicts, without any event plumbing, what the field holds, which
//! passwords get hashed and which warnings appear for a user who only types
//! letters, digits and spaces, presses the hotkey, and moves focus between the
//! field and nowhere. Anything outside that scope is reported as unsupported
//! so tests can filter it out.

use keymask_core::{MaskConfig, Warning};

use crate::{model::Operation, sim_services::SimServices};

/// Model state.
#[derive(Debug, Clone)]
pub struct ModelField {
    config: MaskConfig,
    domain: String,
    focused: bool,
    /// Originals behind each mask code, while a session is live
    session: Option<Vec<char>>,
    value: String,
    armed: bool,
    derivations: Vec<String>,
    warnings: Vec<Warning>,
}

impl ModelField {
    /// Unfocused, empty field on a page whose domain is `domain`.
    pub fn new(config: MaskConfig, domain: impl Into<String>) -> Self {
        Self {
            config,
            domain: domain.into(),
            focused: false,
            session: None,
            value: String::new(),
            armed: false,
            derivations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether the model covers `op`.
    pub fn supports(op: &Operation) -> bool {
        match op {
            Operation::Type { key } => key.char().is_ascii_alphanumeric() || key.char() == ' ',
            Operation::Hotkey | Operation::Refocus | Operation::Blur => true,
            _ => false,
        }
    }

    /// Apply `op`. Returns `false`, changing nothing, if unsupported.
    pub fn apply(&mut self, op: &Operation) -> bool {
        if !Self::supports(op) {
            return false;
        }

        match op {
            Operation::Type { key } => self.type_char(key.char()),
            Operation::Hotkey => self.hotkey(),
            Operation::Refocus => self.refocus(),
            Operation::Blur => self.blur(),
            _ => {},
        }
        true
    }

    /// Predicted field value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Predicted hasher inputs, oldest first.
    pub fn derivations(&self) -> &[String] {
        &self.derivations
    }

    /// Predicted warnings, oldest first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Session expected to be live.
    pub fn is_protecting(&self) -> bool {
        self.session.is_some()
    }

    fn trip(&mut self) {
        if self.armed {
            self.armed = false;
            self.value.clear();
        }
    }

    fn type_char(&mut self, ch: char) {
        if !self.focused {
            return;
        }
        // keydown
        self.trip();

        let capacity = self.config.mask_capacity();
        let base = u32::from(self.config.mask_base);
        let Some(originals) = self.session.as_mut() else {
            // keypress default action
            self.value.push(ch);
            return;
        };

        if originals.len() >= capacity {
            self.warnings.push(Warning::PasswordTooLong);
            self.session = None;
            return;
        }

        if let Some(mask) = char::from_u32(base + originals.len() as u32) {
            self.value.push(mask);
        }
        originals.push(ch);
    }

    fn hotkey(&mut self) {
        if self.focused {
            self.trip();
            self.value.clear();
            if self.session.is_none() {
                self.session = Some(Vec::new());
            }
        } else {
            // Search path: focus moves to the field, then the session attaches
            self.focused = true;
            self.trip();
            self.session = Some(Vec::new());
        }
    }

    fn refocus(&mut self) {
        if !self.focused {
            self.focused = true;
            self.trip();
        }
    }

    fn blur(&mut self) {
        if !self.focused {
            return;
        }
        self.focused = false;

        let Some(originals) = self.session.take() else {
            return;
        };
        if self.value.is_empty() {
            return;
        }

        let body = self.value.strip_prefix(self.config.prefix.as_str()).unwrap_or(self.value.as_str());
        if body.chars().count() < self.config.min_password_len {
            self.warnings.push(Warning::PasswordTooShort);
            self.value.clear();
            return;
        }

        let base = u32::from(self.config.mask_base);
        let password: String = body
            .chars()
            .map(|ch| {
                (ch as u32)
                    .checked_sub(base)
                    .and_then(|index| originals.get(index as usize).copied())
                    .unwrap_or(ch)
            })
            .collect();

        self.value = SimServices::expected(&password, &self.domain);
        self.derivations.push(password);
        self.armed = true;
    }
}
