//! Synchronous Event Dispatch Types
//!
//! Models the slice of host-environment eventing the guard depends on:
//! cancelable submit events, capture-phase listener ordering, and custom
//! events carrying a structured detail payload.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::Document;

/// The event name a form submission dispatches
pub const SUBMIT: &str = "submit";

/// Callback signature for event listeners
///
/// Listeners receive the owning document rather than capturing it, which
/// keeps the listener registry free of reference cycles.
pub type ListenerFn = dyn FnMut(&Document, &mut Event);

/// A registered listener and the phase it runs in
#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) callback: Rc<RefCell<ListenerFn>>,
}

/// A synchronous event traveling through the document
#[derive(Debug)]
pub struct Event {
    kind: String,
    target: NodeId,
    detail: Option<serde_json::Value>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Create a plain event of the given kind
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            detail: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create a custom event carrying a structured detail payload
    pub fn custom(kind: impl Into<String>, target: NodeId, detail: serde_json::Value) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(kind, target)
        }
    }

    /// Event kind, e.g. `"submit"` or `"honeypot:blocked"`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The node the event was dispatched from
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Detail payload of a custom event
    pub fn detail(&self) -> Option<&serde_json::Value> {
        self.detail.as_ref()
    }

    /// Cancel the event's default action (for submit: the submission itself)
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Keep the event from reaching listeners on other nodes
    ///
    /// Listeners already collected for the current node still run, matching
    /// host-environment `stopPropagation` semantics.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether the default action was cancelled
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether propagation was stopped
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_flags_start_clear() {
        let ev = Event::new(SUBMIT, NodeId(7));
        assert!(!ev.default_prevented());
        assert!(!ev.propagation_stopped());
        assert_eq!(ev.kind(), "submit");
    }

    #[test]
    fn test_custom_event_detail() {
        let detail = serde_json::json!({ "value": "http://spam.example" });
        let ev = Event::custom("honeypot:blocked", NodeId(3), detail);
        assert_eq!(
            ev.detail().unwrap()["value"].as_str(),
            Some("http://spam.example")
        );
    }
}
