//! In-memory page.
//!
//! A frame tree of documents holding inputs and forms, a single focus, and
//! per-element listener bookkeeping. Implements [`Page`] for the core and
//! applies [`Action`]s the way a browser host would, returning any follow-up
//! events (focus changes) the host would see.
//!
//! Listener bookkeeping is strict: attaching twice, detaching what was never
//! attached, or mixing up lockdown listeners is recorded in
//! [`SimPage::listener_errors`] rather than silently tolerated.

use std::collections::{BTreeMap, BTreeSet};

use keymask_core::{AccessError, Action, ElementId, ElementInfo, FrameId, Page, PageEvent};
use tracing::trace;

#[derive(Debug, Clone)]
struct SimElement {
    frame: FrameId,
    info: ElementInfo,
    value: String,
    form: Option<ElementId>,
    secure: bool,
    selected: bool,
}

#[derive(Debug, Clone)]
struct SimFrame {
    uri: String,
    inputs: Vec<ElementId>,
    children: Vec<FrameId>,
    blocked: bool,
}

/// Simulated document tree.
#[derive(Debug, Clone)]
pub struct SimPage {
    elements: BTreeMap<ElementId, SimElement>,
    frames: BTreeMap<FrameId, SimFrame>,
    body: ElementId,
    focused: Option<ElementId>,
    session_listeners: BTreeSet<ElementId>,
    lockdown_listeners: BTreeSet<ElementId>,
    listener_errors: Vec<String>,
    next_id: u64,
}

impl SimPage {
    /// Root frame id.
    pub const ROOT: FrameId = FrameId(0);

    /// Empty top-level document at `uri`, with only a body.
    pub fn new(uri: impl Into<String>) -> Self {
        let root = SimFrame {
            uri: uri.into(),
            inputs: Vec::new(),
            children: Vec::new(),
            blocked: false,
        };

        let mut page = Self {
            elements: BTreeMap::new(),
            frames: BTreeMap::from([(Self::ROOT, root)]),
            body: ElementId(0),
            focused: None,
            session_listeners: BTreeSet::new(),
            lockdown_listeners: BTreeSet::new(),
            listener_errors: Vec::new(),
            next_id: 1,
        };
        page.body = page.insert(Self::ROOT, ElementInfo::other("BODY"), None);
        page
    }

    fn insert(&mut self, frame: FrameId, info: ElementInfo, form: Option<ElementId>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, SimElement {
            frame,
            info,
            value: String::new(),
            form,
            secure: false,
            selected: false,
        });
        id
    }

    /// Add a `<form>` to `frame`.
    pub fn add_form(&mut self, frame: FrameId) -> ElementId {
        self.insert(frame, ElementInfo::other("FORM"), None)
    }

    /// Add an `<input type=input_type>` to `frame`, optionally inside `form`.
    pub fn add_input(
        &mut self,
        frame: FrameId,
        input_type: &str,
        form: Option<ElementId>,
    ) -> ElementId {
        let id = self.insert(frame, ElementInfo::input(input_type), form);
        if let Some(doc) = self.frames.get_mut(&frame) {
            doc.inputs.push(id);
        }
        id
    }

    /// Add a nested frame under `parent`.
    pub fn add_frame(&mut self, parent: FrameId, uri: impl Into<String>) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        self.frames.insert(id, SimFrame {
            uri: uri.into(),
            inputs: Vec::new(),
            children: Vec::new(),
            blocked: false,
        });
        if let Some(doc) = self.frames.get_mut(&parent) {
            doc.children.push(id);
        }
        id
    }

    /// Make `frame` refuse inspection, as a cross-origin frame would.
    pub fn block_frame(&mut self, frame: FrameId) {
        if let Some(doc) = self.frames.get_mut(&frame) {
            doc.blocked = true;
        }
    }

    /// Top-level body.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Every element, in creation order.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.keys().copied().collect()
    }

    /// Currently focused element.
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Target for keyboard input: the focused element, or the body.
    pub fn key_target(&self) -> ElementId {
        self.focused.unwrap_or(self.body)
    }

    /// Move focus. Returns the blur and focus events this causes.
    pub fn move_focus(&mut self, target: Option<ElementId>) -> Vec<PageEvent> {
        if self.focused == target {
            return vec![];
        }

        let mut events = Vec::new();
        if let Some(old) = self.focused {
            events.push(PageEvent::blur(old));
        }
        if let Some(new) = target {
            events.push(PageEvent::focus(new));
        }
        self.focused = target;
        events
    }

    /// Overwrite a field's value, as a paste or script would.
    pub fn set_value(&mut self, field: ElementId, value: &str) {
        if let Some(element) = self.elements.get_mut(&field) {
            element.value = value.to_string();
            element.selected = false;
        }
    }

    /// Browser default action for a character keypress.
    pub fn insert_char(&mut self, field: ElementId, ch: char) {
        if let Some(element) = self.elements.get_mut(&field)
            && element.info.tag == "INPUT"
        {
            if element.selected {
                element.value.clear();
                element.selected = false;
            }
            element.value.push(ch);
        }
    }

    /// Owning form, if any.
    pub fn form(&self, field: ElementId) -> Option<ElementId> {
        self.elements.get(&field).and_then(|element| element.form)
    }

    /// Field carries the "secure" marker.
    pub fn is_secure(&self, field: ElementId) -> bool {
        self.elements.get(&field).is_some_and(|element| element.secure)
    }

    /// Fields carrying the "secure" marker.
    pub fn secure_fields(&self) -> Vec<ElementId> {
        self.elements.iter().filter(|(_, el)| el.secure).map(|(id, _)| *id).collect()
    }

    /// Fields with session listeners attached.
    pub fn attached_fields(&self) -> Vec<ElementId> {
        self.session_listeners.iter().copied().collect()
    }

    /// Fields with lockdown listeners attached.
    pub fn lockdown_fields(&self) -> Vec<ElementId> {
        self.lockdown_listeners.iter().copied().collect()
    }

    /// Listener misuse seen so far.
    pub fn listener_errors(&self) -> &[String] {
        &self.listener_errors
    }

    /// Apply one host action. Returns follow-up events.
    pub fn apply(&mut self, action: &Action) -> Vec<PageEvent> {
        trace!(field = ?action.field(), "applying host action");

        match action {
            Action::ClearValue { field } => self.set_value(*field, ""),
            Action::SetValue { field, value } => self.set_value(*field, value),
            Action::AppendChar { field, ch } => {
                if let Some(element) = self.elements.get_mut(field) {
                    element.value.push(*ch);
                    element.selected = false;
                }
            },
            Action::Focus { field } => return self.move_focus(Some(*field)),
            Action::Select { field } => {
                if let Some(element) = self.elements.get_mut(field) {
                    element.selected = true;
                }
            },
            Action::SetSecureMarker { field } => self.mark_secure(*field, true),
            Action::ClearSecureMarker { field } => self.mark_secure(*field, false),
            Action::Attach { field } => {
                if !self.session_listeners.insert(*field) {
                    self.listener_errors.push(format!("{field}: session listeners attached twice"));
                }
            },
            Action::Detach { field } => {
                if !self.session_listeners.remove(field) {
                    self.listener_errors.push(format!("{field}: detach without attach"));
                }
            },
            Action::ArmLockdown { field } => {
                if !self.lockdown_listeners.insert(*field) {
                    self.listener_errors.push(format!("{field}: lockdown armed twice"));
                }
            },
            Action::ReleaseLockdown { field } => {
                if !self.lockdown_listeners.remove(field) {
                    self.listener_errors.push(format!("{field}: lockdown released while unarmed"));
                }
            },
            Action::Warn(warning) => {
                self.listener_errors.push(format!("warning reached the host: {warning:?}"));
            },
        }

        vec![]
    }

    fn mark_secure(&mut self, field: ElementId, secure: bool) {
        if let Some(element) = self.elements.get_mut(&field) {
            element.secure = secure;
        }
    }

    fn frame(&self, frame: FrameId) -> Result<&SimFrame, AccessError> {
        match self.frames.get(&frame) {
            Some(doc) if doc.blocked => {
                Err(AccessError::Frame { frame, reason: "cross-origin".to_string() })
            },
            Some(doc) => Ok(doc),
            None => Err(AccessError::Frame { frame, reason: "no such frame".to_string() }),
        }
    }
}

impl Page for SimPage {
    fn active_element(&self) -> Option<ElementId> {
        self.focused
    }

    fn element(&self, id: ElementId) -> Result<ElementInfo, AccessError> {
        let element = self
            .elements
            .get(&id)
            .ok_or(AccessError::Element { element: id, reason: "detached".to_string() })?;

        self.frame(element.frame).map_err(|_| AccessError::Element {
            element: id,
            reason: "inside an inaccessible frame".to_string(),
        })?;

        Ok(element.info.clone())
    }

    fn root_frame(&self) -> FrameId {
        Self::ROOT
    }

    fn frame_inputs(&self, frame: FrameId) -> Result<Vec<ElementId>, AccessError> {
        self.frame(frame).map(|doc| doc.inputs.clone())
    }

    fn child_frames(&self, frame: FrameId) -> Result<Vec<FrameId>, AccessError> {
        self.frame(frame).map(|doc| doc.children.clone())
    }

    fn value(&self, field: ElementId) -> String {
        self.elements.get(&field).map(|element| element.value.clone()).unwrap_or_default()
    }

    fn form_of(&self, field: ElementId) -> Option<ElementId> {
        self.form(field)
    }

    fn document_uri(&self, field: ElementId) -> String {
        self.elements
            .get(&field)
            .and_then(|element| self.frames.get(&element.frame))
            .map(|doc| doc.uri.clone())
            .unwrap_or_default()
    }
}

/// Login page used by most scenarios.
///
/// ```text
/// root (https://www.example.com/login)
/// ├── form
/// │   ├── user     (text)
/// │   └── password (password)
/// ├── frame        (https://accounts.example.net/)
/// │   └── frame_password (password)
/// └── blocked      (cross-origin, password inside)
/// ```
#[derive(Debug, Clone)]
pub struct LoginFixture {
    /// The page
    pub page: SimPage,
    /// Login form
    pub form: ElementId,
    /// Username input
    pub user: ElementId,
    /// Top-level password input
    pub password: ElementId,
    /// Accessible nested frame
    pub frame: FrameId,
    /// Password input inside `frame`
    pub frame_password: ElementId,
    /// Inaccessible nested frame
    pub blocked: FrameId,
}

impl LoginFixture {
    /// Build the fixture page. Nothing is focused.
    pub fn new() -> Self {
        let mut page = SimPage::new("https://www.example.com/login");
        let form = page.add_form(SimPage::ROOT);
        let user = page.add_input(SimPage::ROOT, "text", Some(form));
        let password = page.add_input(SimPage::ROOT, "password", Some(form));

        let frame = page.add_frame(SimPage::ROOT, "https://accounts.example.net/");
        let frame_password = page.add_input(frame, "password", None);

        let blocked = page.add_frame(SimPage::ROOT, "https://ads.example.org/");
        page.add_input(blocked, "password", None);
        page.block_frame(blocked);

        Self { page, form, user, password, frame, frame_password, blocked }
    }
}

impl Default for LoginFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use keymask_core::find_password_field;

    use super::*;

    #[test]
    fn fixture_search_finds_top_level_password() {
        let fixture = LoginFixture::new();
        assert_eq!(find_password_field(&fixture.page), Some(fixture.password));
    }

    #[test]
    fn blocked_frame_refuses_inspection() {
        let fixture = LoginFixture::new();
        assert!(fixture.page.frame_inputs(fixture.blocked).is_err());
        assert!(fixture.page.child_frames(fixture.blocked).is_err());
        assert!(fixture.page.frame_inputs(fixture.frame).is_ok());
    }

    #[test]
    fn focus_change_reports_blur_then_focus() {
        let mut fixture = LoginFixture::new();
        assert_eq!(fixture.page.move_focus(Some(fixture.user)), vec![PageEvent::focus(
            fixture.user
        )]);

        let events = fixture.page.move_focus(Some(fixture.password));
        assert_eq!(events, vec![PageEvent::blur(fixture.user), PageEvent::focus(fixture.password)]);
        assert!(fixture.page.move_focus(Some(fixture.password)).is_empty());
    }

    #[test]
    fn double_attach_is_recorded() {
        let mut fixture = LoginFixture::new();
        let field = fixture.password;
        fixture.page.apply(&Action::Attach { field });
        assert!(fixture.page.listener_errors().is_empty());

        fixture.page.apply(&Action::Attach { field });
        fixture.page.apply(&Action::Detach { field });
        fixture.page.apply(&Action::Detach { field });
        assert_eq!(fixture.page.listener_errors().len(), 2);
    }

    #[test]
    fn select_then_type_replaces_value() {
        let mut fixture = LoginFixture::new();
        let field = fixture.user;
        fixture.page.set_value(field, "old");
        fixture.page.apply(&Action::Select { field });
        fixture.page.insert_char(field, 'n');
        assert_eq!(fixture.page.value(field), "n");
    }

    #[test]
    fn document_uri_follows_frame() {
        let fixture = LoginFixture::new();
        assert_eq!(fixture.page.document_uri(fixture.password), "https://www.example.com/login");
        assert_eq!(
            fixture.page.document_uri(fixture.frame_password),
            "https://accounts.example.net/"
        );
    }
}
