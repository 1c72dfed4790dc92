//! Derivation collaborators.
//!
//! The hash function and the domain extractor live outside this crate. Both
//! are assumed deterministic: the same inputs always yield the same output.

/// Turns a master password and a domain into the site-specific password.
pub trait PasswordHasher {
    /// Derive the site password.
    fn derive(&self, password: &str, domain: &str) -> String;
}

/// Reduces a document location to the domain that keys the hash.
pub trait DomainExtractor {
    /// Domain for `uri`.
    fn extract_domain(&self, uri: &str) -> String;
}
