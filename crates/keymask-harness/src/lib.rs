//! Deterministic simulation harness for keymask.
//!
//! An in-memory page, recording collaborators, and a driver that emulates the
//! browser's capturing-phase dispatch and default actions. Everything runs
//! synchronously on one thread, so every run is reproducible.
//!
//! # Model-Based Testing
//!
//! The `model` module provides random [`Operation`]s and a reference
//! [`ModelField`]. Operations are applied to both the model and the driver,
//! and their observable outcomes are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties after every
//! dispatched event. Use [`InvariantRegistry::standard()`] for the full set.

#![forbid(unsafe_code)]

pub mod invariants;
pub mod model;
pub mod sim_driver;
pub mod sim_page;
pub mod sim_services;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, ListenerBalance, MaskCursorBounds,
    SecureMarkerConsistency, SessionSnapshot, SingletonSession, SystemSnapshot, Violation,
};
pub use model::{CHARSET, KeyChoice, ModelField, Operation};
pub use sim_driver::{ObservedEvent, SimDriver, key_code_for};
pub use sim_page::{LoginFixture, SimPage};
pub use sim_services::{SimLocalizer, SimNotifier, SimServices};
