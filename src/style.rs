//! Hidden-Field Style Rule
//!
//! Installs the style rule that keeps a honeypot field invisible and
//! non-interactive for humans: positioned off-viewport, zero opacity, zero
//! size, no pointer events.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::dom::{Document, DocumentId};

/// Marker attribute on the installed `<style>` node
pub const STYLE_MARKER_ATTR: &str = "data-honeypot-style";

/// The hiding rule for the given class name
fn hide_rule(class: &str) -> String {
    format!(
        ".{class} {{\n  position: absolute !important;\n  left: -9999px !important;\n  opacity: 0 !important;\n  pointer-events: none !important;\n  height: 0 !important;\n  width: 0 !important;\n}}\n"
    )
}

/// Idempotent installer for the hidden-field style rule
///
/// Installed state is scoped to this object rather than a process-wide
/// flag, so tests can run guards in isolation. At most one rule is ever
/// appended per document per installer lifetime.
#[derive(Debug, Default)]
pub struct StyleInstaller {
    installed: RefCell<HashSet<DocumentId>>,
}

impl StyleInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the hiding rule to the document head, at most once
    pub fn ensure_installed(&self, doc: &Document, class: &str) {
        if !self.installed.borrow_mut().insert(doc.id()) {
            return;
        }

        let style = doc.create_element("style");
        // Head mutations cannot fail on freshly created nodes; the missing-
        // head case is left to the environment
        let _ = doc.set_attribute(style, STYLE_MARKER_ATTR, "true");
        let _ = doc.set_text(style, &hide_rule(class));
        let _ = doc.append_child(doc.head(), style);

        tracing::debug!("Installed hidden-field style rule for .{}", class);
    }

    /// Whether this installer has already covered the document
    pub fn is_installed(&self, doc: &Document) -> bool {
        self.installed.borrow().contains(&doc.id())
    }

    /// Forget every installation, for test isolation
    pub fn reset_for_tests(&self) {
        self.installed.borrow_mut().clear();
    }
}
