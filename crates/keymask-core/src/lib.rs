//! Keymask core
//!
//! Pure state machines for entering a master password into a web page without
//! exposing the real keystrokes to page scripts. Every real character typed
//! into a protected field is replaced by a reversible placeholder, and the true
//! password is reconstructed only at the moment a site-specific password is
//! derived from it.
//!
//! # Components
//!
//! - [`Controller`]: lifecycle owner and the single user-warning primitive
//! - [`TriggerMonitor`]: watches every keystroke for the hotkey or the typed
//!   prefix and hands off to a session
//! - [`ProtectionSession`]: masks keystrokes on one field, finalizes on
//!   blur/submit
//! - [`Lockdowns`]: single-fire tripwires that wipe a finalized field on the
//!   next edit attempt
//!
//! # Execution model
//!
//! Nothing in this crate touches the page. Reads go through the [`Page`] trait
//! and every mutation is returned as an [`Action`] for the host to apply before
//! its capturing-phase handler returns. Event flags (propagation stopped,
//! default prevented) are set directly on the borrowed [`PageEvent`].
//!
//! ```text
//! keystroke ─> Controller ─> Lockdowns ─> TriggerMonitor ─> ProtectionSession
//!                   │                            │                  │
//!                   └──── warn_user <── Warn ────┴───── Actions ────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod action;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod frames;
pub mod keymap;
pub mod lockdown;
pub mod messages;
pub mod monitor;
pub mod page;
pub mod services;
pub mod session;

pub use action::Action;
pub use config::MaskConfig;
pub use controller::Controller;
pub use error::{AccessError, ConfigError, KeyMapFull};
pub use event::{EventFlags, EventKind, PageEvent};
pub use frames::{find_password_field, is_password_input};
pub use keymap::KeyMap;
pub use lockdown::{Lockdowns, Tripwire};
pub use messages::{FallbackLocalizer, Localizer, Notifier, Warning};
pub use monitor::{MonitorState, TriggerMonitor};
pub use page::{ElementId, ElementInfo, FrameId, Page};
pub use services::{DomainExtractor, PasswordHasher};
pub use session::{ProtectionSession, SessionState};
