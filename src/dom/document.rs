//! In-Memory Document
//!
//! A minimal single-threaded model of the host page: an element arena,
//! attribute and style access, form field values, head-scoped style nodes,
//! a loading state with deferred-until-ready callbacks, and synchronous
//! capture/bubble event dispatch.
//!
//! This is plumbing, not a browser. It supplies exactly the surface the
//! form guard consumes, and nothing it does not.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::dom::element::ElementData;
use crate::dom::event::{Event, Listener, SUBMIT};
use crate::error::{Error, Result};

/// Global counter for unique document identities
static DOCUMENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identity of a document within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

/// Handle to a node in the document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index, stable for the lifetime of the document
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Loading state of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Markup is still being parsed; queries may miss late elements
    Loading,
    /// The tree is complete and safe to query
    Complete,
}

enum NodeKind {
    Root,
    Element(ElementData),
}

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

type DeferredFn = Box<dyn FnOnce(&Document)>;

struct DocumentInner {
    nodes: Vec<Node>,
    head: NodeId,
    body: NodeId,
    ready_state: ReadyState,
    custom_events_supported: bool,
    deferred: Vec<DeferredFn>,
    listeners: HashMap<(NodeId, String), Vec<Listener>>,
}

/// A single-threaded document tree with synchronous event dispatch
///
/// Cheap to clone: clones share the same underlying tree, mirroring how
/// every script in a page sees one `document`.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    /// Create a fully loaded document with an empty head and body
    pub fn new() -> Self {
        Self::with_ready_state(ReadyState::Complete)
    }

    /// Create a document still in its loading phase
    ///
    /// Queries work, but ready callbacks are held until
    /// [`finish_loading`](Self::finish_loading).
    pub fn loading() -> Self {
        Self::with_ready_state(ReadyState::Loading)
    }

    fn with_ready_state(ready_state: ReadyState) -> Self {
        let mut nodes = vec![Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Root,
        }];
        let root = NodeId(0);

        let head = NodeId(nodes.len());
        nodes.push(Node {
            parent: Some(root),
            children: Vec::new(),
            kind: NodeKind::Element(ElementData::new("head")),
        });
        let body = NodeId(nodes.len());
        nodes.push(Node {
            parent: Some(root),
            children: Vec::new(),
            kind: NodeKind::Element(ElementData::new("body")),
        });
        nodes[0].children = vec![head, body];

        Self {
            id: DocumentId(DOCUMENT_COUNTER.fetch_add(1, Ordering::Relaxed)),
            inner: Rc::new(RefCell::new(DocumentInner {
                nodes,
                head,
                body,
                ready_state,
                custom_events_supported: true,
                deferred: Vec::new(),
                listeners: HashMap::new(),
            })),
        }
    }

    /// Process-unique identity of this document
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The `<head>` node
    pub fn head(&self) -> NodeId {
        self.inner.borrow().head
    }

    /// The `<body>` node
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    /// Toggle custom-event support, modeling degraded host environments
    /// that cannot construct structured events
    pub fn set_custom_events_supported(&self, supported: bool) {
        self.inner.borrow_mut().custom_events_supported = supported;
    }

    // =========================================================================
    // Ready state
    // =========================================================================

    /// Current loading state
    pub fn ready_state(&self) -> ReadyState {
        self.inner.borrow().ready_state
    }

    /// Run `f` once the document is ready
    ///
    /// Runs immediately if the document is already complete; otherwise the
    /// callback is held for the one-shot ready signal.
    pub fn on_ready(&self, f: impl FnOnce(&Document) + 'static) {
        let ready = self.inner.borrow().ready_state == ReadyState::Complete;
        if ready {
            f(self);
        } else {
            self.inner.borrow_mut().deferred.push(Box::new(f));
        }
    }

    /// Mark the document complete and fire deferred ready callbacks
    pub fn finish_loading(&self) {
        let deferred = {
            let mut inner = self.inner.borrow_mut();
            inner.ready_state = ReadyState::Complete;
            std::mem::take(&mut inner.deferred)
        };
        for f in deferred {
            f(self);
        }
    }

    // =========================================================================
    // Tree construction
    // =========================================================================

    /// Create a floating element; attach it with [`append_child`](Self::append_child)
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.nodes.len());
        inner.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(ElementData::new(tag)),
        });
        id
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if parent.0 >= inner.nodes.len() {
            return Err(Error::DetachedNode(parent.0));
        }
        if child.0 >= inner.nodes.len() {
            return Err(Error::DetachedNode(child.0));
        }
        inner.nodes[child.0].parent = Some(parent);
        inner.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Tag name of an element
    pub fn tag(&self, id: NodeId) -> Result<String> {
        let inner = self.inner.borrow();
        match &inner.nodes.get(id.0).ok_or(Error::DetachedNode(id.0))?.kind {
            NodeKind::Element(el) => Ok(el.tag.clone()),
            NodeKind::Root => Ok(String::new()),
        }
    }

    fn with_element<T>(&self, id: NodeId, f: impl FnOnce(&ElementData) -> T) -> Result<T> {
        let inner = self.inner.borrow();
        match &inner.nodes.get(id.0).ok_or(Error::DetachedNode(id.0))?.kind {
            NodeKind::Element(el) => Ok(f(el)),
            NodeKind::Root => Err(Error::DetachedNode(id.0)),
        }
    }

    fn with_element_mut<T>(&self, id: NodeId, f: impl FnOnce(&mut ElementData) -> T) -> Result<T> {
        let mut inner = self.inner.borrow_mut();
        match &mut inner
            .nodes
            .get_mut(id.0)
            .ok_or(Error::DetachedNode(id.0))?
            .kind
        {
            NodeKind::Element(el) => Ok(f(el)),
            NodeKind::Root => Err(Error::DetachedNode(id.0)),
        }
    }

    // =========================================================================
    // Attributes, classes, styles
    // =========================================================================

    /// Set an attribute; the `value` attribute also seeds a field's
    /// live and default values, as in host markup
    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.with_element_mut(id, |el| {
            el.attrs.insert(name.to_string(), value.to_string());
            if name == "value" && el.is_field() {
                el.value = value.to_string();
                el.default_value = value.to_string();
            }
        })
    }

    /// Read an attribute
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.with_element(id, |el| el.attrs.get(name).cloned())
            .ok()
            .flatten()
    }

    /// Check attribute presence (boolean attributes)
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.with_element(id, |el| el.attrs.contains_key(name))
            .unwrap_or(false)
    }

    /// Add a class to an element's class list
    pub fn add_class(&self, id: NodeId, class: &str) -> Result<()> {
        self.with_element_mut(id, |el| el.add_class(class))
    }

    /// Check for a class in an element's class list
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.with_element(id, |el| el.has_class(class)).unwrap_or(false)
    }

    /// Set an inline style property
    pub fn set_style(&self, id: NodeId, prop: &str, value: &str) -> Result<()> {
        self.with_element_mut(id, |el| {
            el.style.insert(prop.to_string(), value.to_string());
        })
    }

    /// Read an inline style property
    pub fn style(&self, id: NodeId, prop: &str) -> Option<String> {
        self.with_element(id, |el| el.style.get(prop).cloned())
            .ok()
            .flatten()
    }

    /// Set text content (style rules, labels)
    pub fn set_text(&self, id: NodeId, text: &str) -> Result<()> {
        self.with_element_mut(id, |el| el.text = text.to_string())
    }

    /// Read text content
    pub fn text(&self, id: NodeId) -> Option<String> {
        self.with_element(id, |el| el.text.clone()).ok()
    }

    // =========================================================================
    // Form fields
    // =========================================================================

    /// Live value of a form field
    pub fn value(&self, id: NodeId) -> Result<String> {
        self.with_element(id, |el| {
            if el.is_field() {
                Ok(el.value.clone())
            } else {
                Err(Error::not_a_field(el.tag.clone()))
            }
        })?
    }

    /// Set the live value of a form field
    pub fn set_value(&self, id: NodeId, value: &str) -> Result<()> {
        self.with_element_mut(id, |el| {
            if el.is_field() {
                el.value = value.to_string();
                Ok(())
            } else {
                Err(Error::not_a_field(el.tag.clone()))
            }
        })?
    }

    /// Reset every field under `form` to its default value
    pub fn reset_form(&self, form: NodeId) -> Result<()> {
        let tag = self.tag(form)?;
        if tag != "form" {
            return Err(Error::not_a_form(tag));
        }
        let fields = self.descendants(form);
        let mut inner = self.inner.borrow_mut();
        for id in fields {
            if let NodeKind::Element(el) = &mut inner.nodes[id.0].kind {
                if el.is_field() {
                    el.value = el.default_value.clone();
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All descendants of `scope` in document order
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        if let Some(node) = inner.nodes.get(scope.0) {
            stack.extend(node.children.iter().rev().copied());
        }
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(inner.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// First descendant of `scope` with a matching `name` attribute
    pub fn find_by_name(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.find_all_by_name(scope, name).into_iter().next()
    }

    /// Every descendant of `scope` with a matching `name` attribute
    pub fn find_all_by_name(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.attribute(id, "name").as_deref() == Some(name))
            .collect()
    }

    /// First descendant of `scope` carrying the given class
    pub fn find_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| self.has_class(id, class))
    }

    /// Every element in the document with the given tag and attribute
    /// present, in document order (`tag[attr]`)
    pub fn find_all_with_attribute(&self, tag: &str, attr: &str) -> Vec<NodeId> {
        self.descendants(NodeId(0))
            .into_iter()
            .filter(|&id| {
                self.tag(id).map(|t| t == tag).unwrap_or(false) && self.has_attribute(id, attr)
            })
            .collect()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register an event listener on a node
    ///
    /// `capture` listeners run while the event descends toward the target,
    /// before any non-capture listener on nodes below them.
    pub fn add_event_listener(
        &self,
        target: NodeId,
        kind: &str,
        capture: bool,
        callback: impl FnMut(&Document, &mut Event) + 'static,
    ) {
        let mut inner = self.inner.borrow_mut();
        inner
            .listeners
            .entry((target, kind.to_string()))
            .or_default()
            .push(Listener {
                capture,
                callback: Rc::new(RefCell::new(callback)),
            });
    }

    /// Number of listeners registered on a node for an event kind
    pub fn listener_count(&self, target: NodeId, kind: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&(target, kind.to_string()))
            .map(|v| v.len())
            .unwrap_or(0)
    }

    fn ancestor_chain(&self, target: NodeId) -> SmallVec<[NodeId; 8]> {
        let inner = self.inner.borrow();
        let mut chain: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            chain.push(id);
            current = inner.nodes.get(id.0).and_then(|n| n.parent);
        }
        chain.reverse(); // root first, target last
        chain
    }

    fn listeners_for(&self, node: NodeId, kind: &str, capture: bool) -> Vec<Listener> {
        let inner = self.inner.borrow();
        inner
            .listeners
            .get(&(node, kind.to_string()))
            .map(|ls| {
                ls.iter()
                    .filter(|l| l.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn run_listeners(&self, listeners: Vec<Listener>, event: &mut Event) {
        for listener in listeners {
            (&mut *listener.callback.borrow_mut())(self, event);
        }
    }

    /// Dispatch an event through the document
    ///
    /// Capture phase root-to-target, then the target (capture listeners
    /// first), then bubble target-to-root. `stop_propagation` keeps the
    /// event from reaching further nodes.
    pub fn dispatch(&self, event: &mut Event) {
        let chain = self.ancestor_chain(event.target());
        let target = event.target();

        // Capture phase, root toward target
        for &node in chain.iter().take(chain.len().saturating_sub(1)) {
            if event.propagation_stopped() {
                return;
            }
            let listeners = self.listeners_for(node, event.kind(), true);
            self.run_listeners(listeners, event);
        }

        // At target: capture listeners before bubble listeners
        if event.propagation_stopped() {
            return;
        }
        let mut at_target = self.listeners_for(target, event.kind(), true);
        at_target.extend(self.listeners_for(target, event.kind(), false));
        self.run_listeners(at_target, event);

        // Bubble phase, target toward root
        for &node in chain.iter().rev().skip(1) {
            if event.propagation_stopped() {
                return;
            }
            let listeners = self.listeners_for(node, event.kind(), false);
            self.run_listeners(listeners, event);
        }
    }

    /// Dispatch a custom event with a structured detail from `target`
    ///
    /// Fails when the document's environment cannot construct custom
    /// events; callers on best-effort paths swallow that.
    pub fn dispatch_custom(
        &self,
        target: NodeId,
        kind: &str,
        detail: serde_json::Value,
    ) -> Result<Event> {
        if !self.inner.borrow().custom_events_supported {
            return Err(Error::CustomEventsUnsupported);
        }
        let mut event = Event::custom(kind, target, detail);
        self.dispatch(&mut event);
        Ok(event)
    }

    /// Fire a submission attempt on a form
    ///
    /// Returns the settled event; a `default_prevented` result means the
    /// submission was cancelled and would never leave the page.
    pub fn request_submit(&self, form: NodeId) -> Result<Event> {
        let tag = self.tag(form)?;
        if tag != "form" {
            return Err(Error::not_a_form(tag));
        }
        let mut event = Event::new(SUBMIT, form);
        self.dispatch(&mut event);
        Ok(event)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_form() -> (Document, NodeId) {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.append_child(doc.body(), form).unwrap();
        (doc, form)
    }

    #[test]
    fn test_document_ids_unique() {
        assert_ne!(Document::new().id(), Document::new().id());
    }

    #[test]
    fn test_value_attribute_seeds_default() {
        let (doc, form) = doc_with_form();
        let input = doc.create_element("input");
        doc.set_attribute(input, "value", "seed").unwrap();
        doc.append_child(form, input).unwrap();

        doc.set_value(input, "edited").unwrap();
        assert_eq!(doc.value(input).unwrap(), "edited");

        doc.reset_form(form).unwrap();
        assert_eq!(doc.value(input).unwrap(), "seed");
    }

    #[test]
    fn test_value_on_non_field_errors() {
        let (doc, form) = doc_with_form();
        assert!(doc.value(form).is_err());
    }

    #[test]
    fn test_find_by_name_scoped_to_subtree() {
        let doc = Document::new();
        let form_a = doc.create_element("form");
        let form_b = doc.create_element("form");
        doc.append_child(doc.body(), form_a).unwrap();
        doc.append_child(doc.body(), form_b).unwrap();

        let input = doc.create_element("input");
        doc.set_attribute(input, "name", "email").unwrap();
        doc.append_child(form_b, input).unwrap();

        assert_eq!(doc.find_by_name(form_a, "email"), None);
        assert_eq!(doc.find_by_name(form_b, "email"), Some(input));
    }

    #[test]
    fn test_capture_listener_runs_before_bubble() {
        let (doc, form) = doc_with_form();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        doc.add_event_listener(form, SUBMIT, false, move |_, _| {
            o.borrow_mut().push("bubble");
        });
        let o = Rc::clone(&order);
        doc.add_event_listener(form, SUBMIT, true, move |_, _| {
            o.borrow_mut().push("capture");
        });

        doc.request_submit(form).unwrap();
        assert_eq!(*order.borrow(), vec!["capture", "bubble"]);
    }

    #[test]
    fn test_stop_propagation_shields_ancestors() {
        let (doc, form) = doc_with_form();
        let reached = Rc::new(RefCell::new(false));

        doc.add_event_listener(form, SUBMIT, true, |_, ev| {
            ev.stop_propagation();
        });
        let r = Rc::clone(&reached);
        doc.add_event_listener(doc.body(), SUBMIT, false, move |_, _| {
            *r.borrow_mut() = true;
        });

        doc.request_submit(form).unwrap();
        assert!(!*reached.borrow());
    }

    #[test]
    fn test_capture_on_ancestor_beats_target() {
        let (doc, form) = doc_with_form();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        doc.add_event_listener(form, SUBMIT, false, move |_, _| {
            o.borrow_mut().push("target");
        });
        let o = Rc::clone(&order);
        doc.add_event_listener(doc.body(), SUBMIT, true, move |_, _| {
            o.borrow_mut().push("ancestor-capture");
        });

        doc.request_submit(form).unwrap();
        assert_eq!(*order.borrow(), vec!["ancestor-capture", "target"]);
    }

    #[test]
    fn test_request_submit_rejects_non_form() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.body(), div).unwrap();
        assert!(doc.request_submit(div).is_err());
    }

    #[test]
    fn test_deferred_ready_callback_is_one_shot() {
        let doc = Document::loading();
        let runs = Rc::new(RefCell::new(0));

        let r = Rc::clone(&runs);
        doc.on_ready(move |_| *r.borrow_mut() += 1);
        assert_eq!(*runs.borrow(), 0);

        doc.finish_loading();
        assert_eq!(*runs.borrow(), 1);

        // Ready callbacks registered after load run immediately
        let r = Rc::clone(&runs);
        doc.on_ready(move |_| *r.borrow_mut() += 1);
        assert_eq!(*runs.borrow(), 2);
    }

    #[test]
    fn test_degraded_environment_rejects_custom_events() {
        let (doc, form) = doc_with_form();
        doc.set_custom_events_supported(false);
        let err = doc
            .dispatch_custom(form, "honeypot:blocked", serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::CustomEventsUnsupported));
    }
}
