//! User and script gestures for randomized testing.
//!
//! Operations are generated by proptest (and by the fuzzer through
//! `arbitrary`) and replayed against a [`SimDriver`]. They are deliberately
//! small so shrinking produces readable counterexamples.

use arbitrary::Arbitrary;
use keymask_core::{ElementId, EventKind, PageEvent, find_password_field};

use crate::sim_driver::SimDriver;

/// Characters operations can type.
///
/// Covers masked letters and digits, the prefix character, a key with no
/// modelled key code, and a non-ASCII character.
pub const CHARSET: [char; 10] = ['a', 'b', 'z', 'Q', '0', '7', ' ', '@', '!', 'é'];

/// Index into [`CHARSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct KeyChoice(pub u8);

impl KeyChoice {
    /// Character this choice selects.
    pub fn char(self) -> char {
        CHARSET[self.0 as usize % CHARSET.len()]
    }
}

/// One gesture against the simulated page.
///
/// Element indexes wrap around the page's element list, so every value is
/// meaningful on every page.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Type a character on the focused element.
    Type {
        /// Character to type
        key: KeyChoice,
    },

    /// Type the configured prefix.
    TypePrefix,

    /// Press the password hotkey.
    Hotkey,

    /// Press backspace (no character produced).
    Backspace,

    /// Focus an element.
    Focus {
        /// Element index
        target: u8,
    },

    /// Focus the first password field.
    Refocus,

    /// Move focus away from everything.
    Blur,

    /// Submit the focused element's form.
    Submit,

    /// Script-made blur on the focused element.
    UntrustedBlur,

    /// Append text to the focused field without key events.
    Paste {
        /// Character to paste
        key: KeyChoice,
    },

    /// Keypress on the focused element that really came from elsewhere.
    ForeignKeypress {
        /// Index of the true origin element
        origin: u8,
        /// Character carried
        key: KeyChoice,
    },
}

impl Operation {
    /// Replay this operation against `driver`.
    pub fn apply(&self, driver: &mut SimDriver) {
        match self {
            Self::Type { key } => driver.type_char(key.char()),
            Self::TypePrefix => {
                let prefix = driver.controller().config().prefix.clone();
                driver.type_text(&prefix);
            },
            Self::Hotkey => driver.press_hotkey(),
            Self::Backspace => {
                let target = driver.page().key_target();
                driver.dispatch(PageEvent::key_down(target, 8));
                driver.dispatch(PageEvent::new(EventKind::KeyPress, target).with_key_code(8));
                driver.dispatch(PageEvent::key_up(target, 8));
            },
            Self::Focus { target } => {
                let target = element_at(driver, *target);
                driver.focus(target);
            },
            Self::Refocus => {
                if let Some(field) = find_password_field(driver.page()) {
                    driver.focus(field);
                }
            },
            Self::Blur => driver.blur(),
            Self::Submit => driver.submit(),
            Self::UntrustedBlur => driver.untrusted_blur(),
            Self::Paste { key } => driver.paste(&key.char().to_string()),
            Self::ForeignKeypress { origin, key } => {
                let origin = element_at(driver, *origin);
                let target = driver.page().key_target();
                driver.dispatch(PageEvent::key_press(target, key.char()).from_origin(origin));
            },
        }
    }
}

fn element_at(driver: &SimDriver, index: u8) -> ElementId {
    let ids = driver.page().element_ids();
    // A page always has at least its body
    ids.get(index as usize % ids.len().max(1)).copied().unwrap_or(driver.page().body())
}
