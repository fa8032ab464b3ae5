//! Host Environment Model
//!
//! The slice of a browser page the guard actually touches:
//! - Element arena with attributes, classes, inline styles
//! - Form fields with live and default values
//! - Capture/bubble event dispatch and custom events
//! - Document ready state with one-shot deferred callbacks

pub mod document;
pub mod element;
pub mod event;

pub use document::{Document, DocumentId, NodeId, ReadyState};
pub use element::is_field_tag;
pub use event::{Event, ListenerFn, SUBMIT};
