//! End-to-end tests for keystroke masking and finalization.
//!
//! # Oracle Pattern
//!
//! - Page-level listeners never see a protected character
//! - The field holds only mask characters until finalization
//! - The hasher receives exactly what the user typed, once
//! - Warnings match the failure

use keymask_core::{EventKind, MaskConfig, PageEvent, Warning};
use keymask_harness::{InvariantRegistry, LoginFixture, SimDriver, SimServices};

fn protected(fixture: &LoginFixture) -> SimDriver {
    let mut driver =
        SimDriver::new(fixture.page.clone()).with_invariants(InvariantRegistry::standard());
    driver.focus(fixture.password);
    driver.press_hotkey();
    driver
}

#[test]
fn page_never_sees_protected_keystrokes() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    let before = driver.observed().len();

    driver.type_text("Secret99");

    assert_eq!(driver.value(fixture.password), "ABCDEFGH");
    let config = MaskConfig::default();
    for event in &driver.observed()[before..] {
        assert_ne!(event.kind, EventKind::KeyPress, "keypress leaked: {event:?}");
        assert!(!config.conceals(event.key_code), "key code leaked: {event:?}");
    }
    assert!(driver.services().derivations().is_empty());
}

#[test]
fn blur_derives_from_real_keystrokes() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    driver.type_text("Secret99");

    driver.blur();

    assert_eq!(driver.services().derivations(), vec![(
        "Secret99".to_string(),
        "example.com".to_string()
    )]);
    assert_eq!(driver.value(fixture.password), SimServices::expected("Secret99", "example.com"));
    assert!(driver.controller().is_locked_down(fixture.password));
    assert!(driver.page().attached_fields().is_empty());
    assert!(driver.warnings().is_empty());
}

#[test]
fn prefix_is_stripped_before_length_check() {
    let fixture = LoginFixture::new();
    let mut driver =
        SimDriver::new(fixture.page.clone()).with_invariants(InvariantRegistry::standard());
    driver.focus(fixture.password);
    driver.type_text("@@1234");
    assert_eq!(driver.value(fixture.password), "@@ABCD");

    driver.blur();

    assert_eq!(driver.warnings(), vec![Warning::PasswordTooShort]);
    assert_eq!(driver.value(fixture.password), "");
    assert!(driver.services().derivations().is_empty());
    assert!(!driver.controller().is_locked_down(fixture.password));
}

#[test]
fn minimum_length_after_prefix_is_hashed() {
    let fixture = LoginFixture::new();
    let mut driver =
        SimDriver::new(fixture.page.clone()).with_invariants(InvariantRegistry::standard());
    driver.focus(fixture.password);
    driver.type_text("@@12345");

    driver.blur();

    assert_eq!(driver.services().derivations(), vec![(
        "12345".to_string(),
        "example.com".to_string()
    )]);
    assert!(driver.warnings().is_empty());
}

#[test]
fn empty_field_on_blur_drops_marker_silently() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);

    driver.blur();

    assert!(!driver.page().is_secure(fixture.password));
    assert!(driver.warnings().is_empty());
    assert!(driver.services().derivations().is_empty());
    assert!(driver.controller().monitor().session().is_none());
}

#[test]
fn submit_on_owning_form_finalizes() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    driver.type_text("hunter22");

    driver.submit();

    assert_eq!(driver.value(fixture.password), SimServices::expected("hunter22", "example.com"));
    assert_eq!(driver.services().derivations().len(), 1);
    // Still focused; no second finalize on the later blur
    driver.blur();
    assert_eq!(driver.services().derivations().len(), 1);
}

#[test]
fn untrusted_blur_clears_instead_of_hashing() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    driver.type_text("hunter22");

    driver.untrusted_blur();

    assert_eq!(driver.warnings(), vec![Warning::UntrustedEvent]);
    assert_eq!(driver.value(fixture.password), "");
    assert!(!driver.page().is_secure(fixture.password));
    assert!(driver.services().derivations().is_empty());
    assert!(driver.controller().monitor().session().is_none());
}

#[test]
fn untrusted_blur_hashes_when_allowed() {
    let fixture = LoginFixture::new();
    let config = MaskConfig { reject_untrusted_finalize: false, ..MaskConfig::default() };
    let mut driver = SimDriver::with_config(fixture.page.clone(), config)
        .unwrap()
        .with_invariants(InvariantRegistry::standard());
    driver.focus(fixture.password);
    driver.press_hotkey();
    driver.type_text("hunter22");

    driver.untrusted_blur();

    assert_eq!(driver.services().derivations().len(), 1);
    assert!(driver.warnings().is_empty());
}

#[test]
fn exhausted_mask_space_warns_and_stops_protecting() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    let capacity = MaskConfig::default().mask_capacity();
    assert_eq!(capacity, 63);

    driver.type_text(&"k".repeat(capacity));
    assert!(driver.warnings().is_empty());

    driver.type_char('k');

    assert_eq!(driver.warnings(), vec![Warning::PasswordTooLong]);
    assert_eq!(driver.value(fixture.password).chars().count(), capacity);
    assert!(driver.controller().monitor().session().is_none());

    // Nothing left to finalize
    driver.blur();
    assert!(driver.services().derivations().is_empty());
}

#[test]
fn pasted_text_passes_through_reconstruction() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    driver.type_text("abc");
    driver.paste("!x");
    driver.type_text("de");
    assert_eq!(driver.value(fixture.password), "ABC!xDE");

    driver.blur();

    assert_eq!(driver.services().derivations()[0].0, "abc!xde");
}

#[test]
fn frame_field_uses_frame_domain() {
    let fixture = LoginFixture::new();
    let mut driver =
        SimDriver::new(fixture.page.clone()).with_invariants(InvariantRegistry::standard());
    driver.focus(fixture.frame_password);
    driver.press_hotkey();
    driver.type_text("letmein1");

    driver.blur();

    assert_eq!(driver.services().derivations(), vec![(
        "letmein1".to_string(),
        "accounts.example.net".to_string()
    )]);
}

#[test]
fn keypress_from_foreign_origin_aborts_session() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    driver.type_text("ab");

    driver.dispatch(PageEvent::key_press(fixture.password, 'z').from_origin(fixture.user));

    assert!(driver.controller().monitor().session().is_none());
    assert!(driver.page().attached_fields().is_empty());
    // Not masked: the abort happens before masking
    assert_eq!(driver.value(fixture.password), "ABz");

    driver.blur();
    assert!(driver.services().derivations().is_empty());
}

#[test]
fn non_character_keys_keep_default_action() {
    let fixture = LoginFixture::new();
    let mut driver = protected(&fixture);
    driver.type_text("ab");

    driver.dispatch(PageEvent::new(EventKind::KeyPress, fixture.password).with_key_code(8));

    assert_eq!(driver.controller().monitor().protected_field(), Some(fixture.password));
    assert_eq!(driver.value(fixture.password), "AB");
}
