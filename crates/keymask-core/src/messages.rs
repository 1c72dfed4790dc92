//! User warnings.
//!
//! Every recoverable failure that the user needs to know about is a
//! [`Warning`]. The controller resolves it to text through a [`Localizer`] and
//! shows it through a [`Notifier`].

/// Non-fatal conditions reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    /// Hotkey pressed but the page has no password field
    NoPasswordField,
    /// Prefix typed somewhere it cannot start protection
    PrefixFailed,
    /// Mask-code space exhausted
    PasswordTooLong,
    /// Password shorter than the configured minimum
    PasswordTooShort,
    /// Blur/submit dispatched by a script, not the user
    UntrustedEvent,
}

impl Warning {
    /// All warnings.
    pub const ALL: [Self; 5] = [
        Self::NoPasswordField,
        Self::PrefixFailed,
        Self::PasswordTooLong,
        Self::PasswordTooShort,
        Self::UntrustedEvent,
    ];

    /// Localization key.
    pub fn message_key(self) -> &'static str {
        match self {
            Self::NoPasswordField => "pwdkeywarn",
            Self::PrefixFailed => "pwdprefixwarn",
            Self::PasswordTooLong => "longpasswordwarn",
            Self::PasswordTooShort => "shortpasswordwarn",
            Self::UntrustedEvent => "trustedeventwarn",
        }
    }

    /// Built-in English text.
    pub fn fallback_text(self) -> &'static str {
        match self {
            Self::NoPasswordField => "No password field was found on this page.",
            Self::PrefixFailed => {
                "The password prefix only works at the start of an empty password field."
            },
            Self::PasswordTooLong => {
                "Your password is too long to protect. Further keystrokes are not masked."
            },
            Self::PasswordTooShort => {
                "Your password is too short. The field has been cleared; please try again."
            },
            Self::UntrustedEvent => {
                "The page tried to end password entry on your behalf. The field has been cleared."
            },
        }
    }

    /// Reverse of [`Warning::message_key`].
    pub fn from_message_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|warning| warning.message_key() == key)
    }
}

/// Message catalogue lookup.
pub trait Localizer {
    /// Text for a message key.
    fn get_message(&self, key: &str) -> String;
}

/// Blocking user notification.
///
/// Callers never inspect a result; the call returns once the user has seen
/// the message.
pub trait Notifier {
    /// Show a warning.
    fn warn_user(&self, message: &str);
}

/// Serves [`Warning::fallback_text`]. Unknown keys echo back unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackLocalizer;

impl Localizer for FallbackLocalizer {
    fn get_message(&self, key: &str) -> String {
        Warning::from_message_key(key)
            .map_or_else(|| key.to_string(), |warning| warning.fallback_text().to_string())
    }
}
