//! Fuzz target for configuration handling
//!
//! Arbitrary settings either fail validation or produce a controller that
//! survives arbitrary traffic with every invariant intact. Odd mask ranges
//! (tiny, astral, adjacent to surrogates) are the interesting part.

#![no_main]

use arbitrary::Arbitrary;
use keymask_core::MaskConfig;
use keymask_harness::{InvariantRegistry, LoginFixture, Operation, SimDriver};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Settings {
    hotkey_code: u32,
    prefix: String,
    min_password_len: u8,
    mask_base: char,
    mask_ceiling: char,
    concealed_start: u32,
    concealed_end: u32,
    reject_untrusted_finalize: bool,
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    settings: Settings,
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: Scenario| {
    let settings = scenario.settings;
    let config = MaskConfig {
        hotkey_code: settings.hotkey_code,
        prefix: settings.prefix,
        min_password_len: usize::from(settings.min_password_len),
        mask_base: settings.mask_base,
        mask_ceiling: settings.mask_ceiling,
        concealed_keys: settings.concealed_start..=settings.concealed_end,
        reject_untrusted_finalize: settings.reject_untrusted_finalize,
    };

    let valid = config.validate().is_ok();
    let fixture = LoginFixture::new();
    let Ok(driver) = SimDriver::with_config(fixture.page, config) else {
        assert!(!valid, "valid configuration refused");
        return;
    };
    assert!(valid, "invalid configuration accepted");

    let mut driver = driver.with_invariants(InvariantRegistry::standard());
    for op in scenario.operations.iter().take(256) {
        op.apply(&mut driver);
    }
});
