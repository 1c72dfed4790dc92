//! Fuzz target for the event dispatch pipeline
//!
//! # Strategy
//!
//! - Gestures: typing, hotkey, prefix, focus moves, blur and submit
//! - Script traffic: untrusted blur, paste, keypress from a foreign origin
//! - Page shape: login form, same-site frame, cross-origin frame
//!
//! # Invariants
//!
//! - At most one protection session, bound to the monitor's field
//! - Listener attach/arm calls balance with the controller's view
//! - Mask cursor never passes the configured capacity
//! - Secure markers only on the protected field
//! - No listener misuse reaches the page

#![no_main]

use arbitrary::Arbitrary;
use keymask_harness::{InvariantRegistry, LoginFixture, Operation, SimDriver};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: Scenario| {
    let fixture = LoginFixture::new();
    let mut driver =
        SimDriver::new(fixture.page).with_invariants(InvariantRegistry::standard());

    for op in scenario.operations.iter().take(512) {
        op.apply(&mut driver);
    }

    assert!(
        driver.page().listener_errors().is_empty(),
        "listener misuse: {:?}",
        driver.page().listener_errors()
    );
});
