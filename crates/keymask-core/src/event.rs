//! Captured page events.
//!
//! This module defines [`PageEvent`], the single input type of every state
//! machine in the crate. The host builds one per capturing-phase callback and
//! hands it over by mutable reference; whatever flags are set on it when
//! dispatch returns must be applied before the host's handler returns.

use crate::page::ElementId;

/// Event types the core listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Key pressed
    KeyDown,
    /// Character produced
    KeyPress,
    /// Key released
    KeyUp,
    /// Element gained focus
    Focus,
    /// Element lost focus
    Blur,
    /// Form submitted
    Submit,
}

impl EventKind {
    /// DOM event type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyDown => "keydown",
            Self::KeyPress => "keypress",
            Self::KeyUp => "keyup",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Submit => "submit",
        }
    }
}

/// Mutable per-event flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    /// Page listeners must not see this event
    pub propagation_stopped: bool,
    /// Browser default action (character insertion) suppressed
    pub default_prevented: bool,
    /// This keydown was the password hotkey
    pub hotkey: bool,
    /// Keystroke already consumed by the prefix trigger
    pub intercepted: bool,
}

/// A captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    kind: EventKind,
    key_code: u32,
    char_code: u32,
    target: ElementId,
    original_target: ElementId,
    trusted: bool,
    flags: EventFlags,
}

impl PageEvent {
    /// Trusted event of `kind` fired at `target`, no key data.
    pub fn new(kind: EventKind, target: ElementId) -> Self {
        Self {
            kind,
            key_code: 0,
            char_code: 0,
            target,
            original_target: target,
            trusted: true,
            flags: EventFlags::default(),
        }
    }

    /// `keydown` with the given key code.
    pub fn key_down(target: ElementId, key_code: u32) -> Self {
        Self::new(EventKind::KeyDown, target).with_key_code(key_code)
    }

    /// `keyup` with the given key code.
    pub fn key_up(target: ElementId, key_code: u32) -> Self {
        Self::new(EventKind::KeyUp, target).with_key_code(key_code)
    }

    /// `keypress` producing `ch`.
    pub fn key_press(target: ElementId, ch: char) -> Self {
        Self::new(EventKind::KeyPress, target).with_char_code(ch as u32)
    }

    /// `focus` on `target`.
    pub fn focus(target: ElementId) -> Self {
        Self::new(EventKind::Focus, target)
    }

    /// `blur` on `target`.
    pub fn blur(target: ElementId) -> Self {
        Self::new(EventKind::Blur, target)
    }

    /// `submit` on `form`.
    pub fn submit(form: ElementId) -> Self {
        Self::new(EventKind::Submit, form)
    }

    /// Set the key code.
    #[must_use]
    pub fn with_key_code(mut self, key_code: u32) -> Self {
        self.key_code = key_code;
        self
    }

    /// Set the character code.
    #[must_use]
    pub fn with_char_code(mut self, char_code: u32) -> Self {
        self.char_code = char_code;
        self
    }

    /// Set the true originating element, distinct from the listener target.
    #[must_use]
    pub fn from_origin(mut self, original_target: ElementId) -> Self {
        self.original_target = original_target;
        self
    }

    /// Mark as script-dispatched rather than user-initiated.
    #[must_use]
    pub fn untrusted(mut self) -> Self {
        self.trusted = false;
        self
    }

    /// Event type.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Key code. 0 for non-keyboard events.
    pub fn key_code(&self) -> u32 {
        self.key_code
    }

    /// Raw character code. 0 if no character was produced.
    pub fn char_code(&self) -> u32 {
        self.char_code
    }

    /// Character produced by a keypress. `None` for non-printing keys and
    /// control characters.
    pub fn character(&self) -> Option<char> {
        if self.char_code == 0 {
            return None;
        }
        char::from_u32(self.char_code).filter(|ch| !ch.is_control())
    }

    /// Element whose listeners are running.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Element the event really originated from.
    pub fn original_target(&self) -> ElementId {
        self.original_target
    }

    /// User-initiated (not dispatched by a script).
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Current flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Hide the event from page listeners.
    pub fn stop_propagation(&mut self) {
        self.flags.propagation_stopped = true;
    }

    /// Suppress the browser's default action.
    pub fn prevent_default(&mut self) {
        self.flags.default_prevented = true;
    }

    pub(crate) fn mark_hotkey(&mut self) {
        self.flags.hotkey = true;
    }

    pub(crate) fn mark_intercepted(&mut self) {
        self.flags.intercepted = true;
    }

    /// Marked by the trigger monitor; sessions must not re-process it.
    pub fn is_marked(&self) -> bool {
        self.flags.hotkey || self.flags.intercepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_exposes_character() {
        let event = PageEvent::key_press(ElementId(1), 'x');
        assert_eq!(event.kind(), EventKind::KeyPress);
        assert_eq!(event.character(), Some('x'));
        assert_eq!(event.char_code(), u32::from(b'x'));
    }

    #[test]
    fn non_printing_keypress_has_no_character() {
        let backspace = PageEvent::new(EventKind::KeyPress, ElementId(1)).with_key_code(8);
        assert_eq!(backspace.character(), None);

        let carriage_return = PageEvent::new(EventKind::KeyPress, ElementId(1)).with_char_code(13);
        assert_eq!(carriage_return.character(), None);

        let surrogate = PageEvent::new(EventKind::KeyPress, ElementId(1)).with_char_code(0xD800);
        assert_eq!(surrogate.character(), None);
    }

    #[test]
    fn origin_defaults_to_target() {
        let event = PageEvent::blur(ElementId(4));
        assert_eq!(event.original_target(), ElementId(4));
        assert!(event.is_trusted());

        let event = event.from_origin(ElementId(9)).untrusted();
        assert_eq!(event.target(), ElementId(4));
        assert_eq!(event.original_target(), ElementId(9));
        assert!(!event.is_trusted());
    }

    #[test]
    fn flags_accumulate() {
        let mut event = PageEvent::key_down(ElementId(1), 113);
        assert!(!event.is_marked());

        event.stop_propagation();
        event.prevent_default();
        event.mark_hotkey();

        let flags = event.flags();
        assert!(flags.propagation_stopped);
        assert!(flags.default_prevented);
        assert!(flags.hotkey);
        assert!(!flags.intercepted);
        assert!(event.is_marked());
    }

    #[test]
    fn kinds_use_dom_type_names() {
        assert_eq!(EventKind::KeyPress.as_str(), "keypress");
        assert_eq!(EventKind::Submit.as_str(), "submit");
    }
}
