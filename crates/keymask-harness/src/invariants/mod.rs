//! Invariant checking for simulated page runs.
//!
//! Invariants are properties that must hold after every dispatched event, no
//! matter what sequence of keystrokes, focus changes and submits led there.
//!
//! # Architecture
//!
//! The driver extracts observable state from the controller and the page into
//! a [`SystemSnapshot`], then runs every registered [`Invariant`] against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let driver = SimDriver::new(LoginFixture::new().page).with_invariants(registry);
//! ```

mod checks;
mod snapshot;

pub use checks::{ListenerBalance, MaskCursorBounds, SecureMarkerConsistency, SingletonSession};
pub use snapshot::{SessionSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against every snapshot.
pub trait Invariant {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;

    /// Build a violation tagged with this invariant's name.
    fn violation(&self, message: String) -> Violation {
        Violation { invariant: self.name(), message }
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Registry with every standard check:
    ///
    /// - [`SingletonSession`]: at most one session, and its listeners are
    ///   the only session listeners on the page
    /// - [`ListenerBalance`]: no double attach/detach, page and controller
    ///   agree on lockdowns
    /// - [`MaskCursorBounds`]: mask cursor stays inside its range
    /// - [`SecureMarkerConsistency`]: the protected field is marked
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingletonSession);
        registry.add(ListenerBalance);
        registry.add(MaskCursorBounds);
        registry.add(SecureMarkerConsistency);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants. Returns every violation found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with context on any violation.
    #[allow(clippy::panic, reason = "test harness assertion")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// No invariants registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
