//! Error types for birdlime

use thiserror::Error;

/// Result type for birdlime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for birdlime
///
/// The taxonomy is deliberately narrow: only document plumbing can fail.
/// The submit interceptor itself is fail-open and never surfaces any of
/// these to the host page.
#[derive(Debug, Error)]
pub enum Error {
    /// No element matched a lookup
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An operation required a `<form>` but got something else
    #[error("Not a form: <{tag}> cannot be instrumented")]
    NotAForm { tag: String },

    /// An operation required a field-bearing element (input, textarea)
    #[error("Not a field: <{tag}> has no submittable value")]
    NotAField { tag: String },

    /// A node handle does not resolve to a live node
    #[error("Detached node: id {0} is not part of the document")]
    DetachedNode(usize),

    /// The document's environment cannot construct custom events
    #[error("Custom events unsupported in this document")]
    CustomEventsUnsupported,

    /// Event detail could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a not-a-form error from the offending tag name
    pub fn not_a_form(tag: impl Into<String>) -> Self {
        Self::NotAForm { tag: tag.into() }
    }

    /// Create a not-a-field error from the offending tag name
    pub fn not_a_field(tag: impl Into<String>) -> Self {
        Self::NotAField { tag: tag.into() }
    }

    /// Check if this is a lookup miss rather than a structural error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ElementNotFound(_))
    }
}
