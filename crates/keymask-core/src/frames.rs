//! Password field discovery across the frame tree.
//!
//! Depth-first, pre-order walk: a frame's own inputs are checked in document
//! order before any of its nested frames, and nested frames are visited in
//! frame-list order. The first password input wins.
//!
//! Every node access is fallible. A frame that refuses inspection (typically
//! cross-origin) is logged and its whole subtree is skipped; the walk carries
//! on with the next sibling.

use tracing::{debug, warn};

use crate::page::{ElementId, Page};

/// Whether `id` is a password `<input>`. Inaccessible elements are not.
pub fn is_password_input<P: Page + ?Sized>(page: &P, id: ElementId) -> bool {
    match page.element(id) {
        Ok(info) => info.is_password_input(),
        Err(err) => {
            warn!(%err, "cannot inspect element");
            false
        },
    }
}

/// First password input in the page or any nested frame. `None` if the frame
/// tree has none that we are allowed to see.
pub fn find_password_field<P: Page + ?Sized>(page: &P) -> Option<ElementId> {
    let mut pending = vec![page.root_frame()];

    while let Some(frame) = pending.pop() {
        let inputs = match page.frame_inputs(frame) {
            Ok(inputs) => inputs,
            Err(err) => {
                warn!(%err, "skipping frame during password field search");
                continue;
            },
        };

        if let Some(field) = inputs.into_iter().find(|&id| is_password_input(page, id)) {
            debug!(%frame, %field, "found password field");
            return Some(field);
        }

        match page.child_frames(frame) {
            // Reversed so the first child is popped next
            Ok(children) => pending.extend(children.into_iter().rev()),
            Err(err) => warn!(%err, "cannot list nested frames"),
        }
    }

    None
}
