//! Recording collaborators.
//!
//! Deterministic stand-ins for the hash function, domain extractor, message
//! catalogue and notification dialog. Each one records what it was asked so
//! tests can check the exact calls.

use std::cell::RefCell;

use keymask_core::{DomainExtractor, Localizer, Notifier, PasswordHasher};

/// Hasher and domain extractor.
///
/// The derived value is an FNV-1a digest of `password|domain`, so it never
/// contains the password itself.
#[derive(Debug, Default)]
pub struct SimServices {
    derivations: RefCell<Vec<(String, String)>>,
}

impl SimServices {
    /// No calls recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(password, domain)` pair passed to [`PasswordHasher::derive`].
    pub fn derivations(&self) -> Vec<(String, String)> {
        self.derivations.borrow().clone()
    }

    /// What [`PasswordHasher::derive`] returns for these inputs.
    pub fn expected(password: &str, domain: &str) -> String {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0100_0000_01b3;

        let digest = password
            .bytes()
            .chain(std::iter::once(b'|'))
            .chain(domain.bytes())
            .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME));

        format!("pw-{digest:016x}")
    }
}

impl PasswordHasher for SimServices {
    fn derive(&self, password: &str, domain: &str) -> String {
        self.derivations.borrow_mut().push((password.to_string(), domain.to_string()));
        Self::expected(password, domain)
    }
}

impl DomainExtractor for SimServices {
    /// Host part of the URI with any leading `www.` removed.
    fn extract_domain(&self, uri: &str) -> String {
        let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
        let host = rest.split(['/', ':', '?', '#']).next().unwrap_or_default();
        host.strip_prefix("www.").unwrap_or(host).to_string()
    }
}

/// Returns the message key itself, so tests can assert on keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimLocalizer;

impl Localizer for SimLocalizer {
    fn get_message(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Records every warning shown to the user.
#[derive(Debug, Default)]
pub struct SimNotifier {
    shown: RefCell<Vec<String>>,
}

impl SimNotifier {
    /// Nothing shown yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far, oldest first.
    pub fn shown(&self) -> Vec<String> {
        self.shown.borrow().clone()
    }
}

impl Notifier for SimNotifier {
    fn warn_user(&self, message: &str) {
        self.shown.borrow_mut().push(message.to_string());
    }
}
