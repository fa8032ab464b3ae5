//! Element Data
//!
//! The per-node payload of the document arena: tag name, attributes,
//! inline style, and the live/default values that form reset relies on.

use std::collections::HashMap;

/// Tags that carry a submittable value
const FIELD_TAGS: &[&str] = &["input", "textarea", "select"];

/// Check whether a tag names a form field
pub fn is_field_tag(tag: &str) -> bool {
    FIELD_TAGS.contains(&tag)
}

/// Payload of an element node
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) style: HashMap<String, String>,
    /// Live value of a field, mutated by whoever fills the form
    pub(crate) value: String,
    /// Value the field returns to on form reset
    pub(crate) default_value: String,
    /// Text content (style rules, labels)
    pub(crate) text: String,
}

impl ElementData {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        let tag: String = tag.into();
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub(crate) fn is_field(&self) -> bool {
        is_field_tag(&self.tag)
    }

    /// Class attribute parsed as a whitespace-separated list
    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .map(|c| c.split_ascii_whitespace().any(|p| p == class))
            .unwrap_or(false)
    }

    pub(crate) fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let entry = self.attrs.entry("class".to_string()).or_default();
        if entry.is_empty() {
            entry.push_str(class);
        } else {
            entry.push(' ');
            entry.push_str(class);
        }
    }
}
