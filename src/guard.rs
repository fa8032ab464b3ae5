//! Form Guard
//!
//! The core of the crate. Per form: locate or synthesize the honeypot
//! field, harden it against autofill and assistive-technology exposure,
//! record the instrumentation timestamp, and intercept submissions with
//! the two-heuristic decision:
//!
//! 1. Faster-than-human submit time → blocked, nothing else happens
//! 2. Non-empty honeypot value → blocked, notify, optionally fake success
//! 3. Otherwise the submission proceeds untouched
//!
//! Everything past the block decision is best-effort: a failure to notify
//! or to dress up the fake success must never leak back into the host
//! page's own submit handling.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::FormPolicy;
use crate::dom::{Document, DocumentId, NodeId, ReadyState, SUBMIT};
use crate::error::{Error, Result};
use crate::style::StyleInstaller;
use crate::{Behavior, GuardConfig};

/// Event dispatched from a form when the honeypot heuristic fires
pub const BLOCKED_EVENT: &str = "honeypot:blocked";

/// Success/failure indicator classes toggled by the silent-success
/// cover-up (Webflow convention)
const DONE_CLASS: &str = "w-form-done";
const FAIL_CLASS: &str = "w-form-fail";

/// Outcome of one submission attempt
///
/// Evaluated fresh on every submit; the checks run in a fixed order and
/// the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Submission arrived faster than a human plausibly could
    BlockedTiming,
    /// The honeypot field came back non-empty
    BlockedHoneypot,
    /// Nothing suspicious; the submission proceeds
    Allowed,
}

/// Detail payload of a [`BLOCKED_EVENT`] notification
#[derive(Debug, Clone, Serialize)]
pub struct BlockedDetail {
    /// Arena index of the blocked form
    pub form: usize,
    /// Arena index of the honeypot field
    pub field: usize,
    /// Trimmed honeypot value that triggered the block
    pub value: String,
}

/// Decide the fate of a submission attempt
///
/// The timing check short-circuits before the honeypot value is even
/// read, so the value callback only runs for plausibly-timed submissions.
pub(crate) fn evaluate(
    elapsed: Duration,
    min_submit: Duration,
    honeypot_value: impl FnOnce() -> String,
) -> Verdict {
    if elapsed < min_submit {
        return Verdict::BlockedTiming;
    }
    if !honeypot_value().trim().is_empty() {
        return Verdict::BlockedHoneypot;
    }
    Verdict::Allowed
}

/// Immutable per-form instrumentation record
struct TrapRecord {
    policy: FormPolicy,
    field: NodeId,
    /// When the interceptor was armed; submissions are measured from here
    armed_at: Cell<Instant>,
}

struct GuardInner {
    config: GuardConfig,
    style: StyleInstaller,
    /// Side table of instrumented forms; doubles as the idempotency marker
    /// so no ad hoc properties are ever attached to host-owned elements
    records: RefCell<HashMap<(DocumentId, NodeId), Rc<TrapRecord>>>,
}

/// The form guard: discovers opted-in forms and arms each one exactly once
///
/// Cheap to clone; clones share the same instrumentation state, like every
/// reference to a script-level singleton in a host page.
#[derive(Clone)]
pub struct Guard {
    inner: Rc<GuardInner>,
}

impl Guard {
    /// Create a guard with the default configuration
    pub fn new() -> Self {
        Self::with_config(GuardConfig::default())
    }

    /// Create a guard with a custom configuration
    pub fn with_config(config: GuardConfig) -> Self {
        Self {
            inner: Rc::new(GuardInner {
                config,
                style: StyleInstaller::new(),
                records: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &GuardConfig {
        &self.inner.config
    }

    /// Discover and instrument every opted-in form in the document
    ///
    /// Safe to re-invoke at any time: already-instrumented forms no-op, so
    /// call this again after injecting forms dynamically. If the document
    /// is still loading, the pass is deferred until it is ready and this
    /// returns 0.
    pub fn install(&self, doc: &Document) -> usize {
        if doc.ready_state() == ReadyState::Loading {
            let guard = self.clone();
            doc.on_ready(move |d| {
                let n = guard.scan(d);
                tracing::info!("Deferred guard pass armed {} form(s)", n);
            });
            return 0;
        }
        self.scan(doc)
    }

    /// One discovery pass: style rule first, then every marked form
    fn scan(&self, doc: &Document) -> usize {
        let config = &self.inner.config;
        self.inner.style.ensure_installed(doc, &config.hide_class);

        let forms = doc.find_all_with_attribute("form", &config.marker_attr);
        forms
            .into_iter()
            .filter(|&form| self.instrument(doc, form).unwrap_or(false))
            .count()
    }

    /// Whether a form has already been instrumented by this guard
    pub fn is_instrumented(&self, doc: &Document, form: NodeId) -> bool {
        self.inner
            .records
            .borrow()
            .contains_key(&(doc.id(), form))
    }

    /// Instrument a single form
    ///
    /// Returns `Ok(true)` when the form was newly armed, `Ok(false)` when
    /// it already was. The instrumentation record is inserted before the
    /// interceptor is attached, so a second discovery pass can never
    /// double-bind.
    pub fn instrument(&self, doc: &Document, form: NodeId) -> Result<bool> {
        let tag = doc.tag(form)?;
        if tag != "form" {
            return Err(Error::not_a_form(tag));
        }

        let key = (doc.id(), form);
        if self.inner.records.borrow().contains_key(&key) {
            return Ok(false);
        }

        let config = &self.inner.config;
        let policy = FormPolicy::resolve_with(
            &config.defaults,
            doc.attribute(form, &config.field_attr).as_deref(),
            doc.attribute(form, &config.behavior_attr).as_deref(),
            doc.attribute(form, &config.min_time_attr).as_deref(),
        );

        let field = match doc.find_by_name(form, &policy.field_name) {
            Some(existing) => {
                // Markup-authored honeypot: normalize it to the same
                // hardened shape as a synthesized one
                self.harden_field(doc, existing)?;
                existing
            }
            None => {
                let input = doc.create_element("input");
                doc.set_attribute(input, "type", "text")?;
                doc.set_attribute(input, "name", &policy.field_name)?;
                self.harden_field(doc, input)?;
                doc.append_child(form, input)?;
                input
            }
        };

        let record = Rc::new(TrapRecord {
            policy,
            field,
            armed_at: Cell::new(Instant::now()),
        });
        self.inner.records.borrow_mut().insert(key, Rc::clone(&record));

        doc.add_event_listener(form, SUBMIT, true, move |doc, event| {
            let policy = &record.policy;
            let verdict = evaluate(
                record.armed_at.get().elapsed(),
                Duration::from_millis(policy.min_submit_ms),
                || doc.value(record.field).unwrap_or_default(),
            );

            match verdict {
                Verdict::Allowed => {}
                Verdict::BlockedTiming => {
                    event.prevent_default();
                    event.stop_propagation();
                    tracing::debug!(
                        "Blocked submission: faster than {}ms",
                        policy.min_submit_ms
                    );
                }
                Verdict::BlockedHoneypot => {
                    event.prevent_default();
                    event.stop_propagation();

                    let value = doc.value(record.field).unwrap_or_default();
                    let trimmed = value.trim();
                    tracing::debug!(
                        "Blocked submission: honeypot {:?} non-empty",
                        policy.field_name
                    );

                    emit_blocked_event(doc, event.target(), record.field, trimmed);
                    if policy.behavior == Behavior::SilentSuccess {
                        apply_silent_success(doc, event.target());
                    }
                }
            }
        });

        tracing::debug!("Armed form with honeypot field {:?}", self.field_name_of(doc, field));
        Ok(true)
    }

    fn field_name_of(&self, doc: &Document, field: NodeId) -> String {
        doc.attribute(field, "name").unwrap_or_default()
    }

    /// Apply the hiding class and the autofill/assistive-technology
    /// suppression markers to a honeypot field
    fn harden_field(&self, doc: &Document, field: NodeId) -> Result<()> {
        doc.set_attribute(field, "autocomplete", "off")?;
        doc.set_attribute(field, "tabindex", "-1")?;
        doc.set_attribute(field, "aria-hidden", "true")?;
        // Credential-manager opt-outs (1Password, LastPass)
        doc.set_attribute(field, "data-1p-ignore", "")?;
        doc.set_attribute(field, "data-lpignore", "true")?;
        doc.add_class(field, &self.inner.config.hide_class)?;
        Ok(())
    }

    /// Forget all instrumentation and style state, for test isolation
    pub fn reset_for_tests(&self) {
        self.inner.records.borrow_mut().clear();
        self.inner.style.reset_for_tests();
    }

    #[cfg(test)]
    fn backdate(&self, doc: &Document, form: NodeId, by: Duration) {
        let records = self.inner.records.borrow();
        let record = records
            .get(&(doc.id(), form))
            .expect("form not instrumented");
        record.armed_at.set(record.armed_at.get() - by);
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort blocked-submission notification
///
/// Contract: never propagates a failure. A degraded environment that
/// cannot construct custom events loses the telemetry, nothing more.
fn emit_blocked_event(doc: &Document, form: NodeId, field: NodeId, value: &str) {
    let detail = BlockedDetail {
        form: form.index(),
        field: field.index(),
        value: value.to_string(),
    };
    let outcome = serde_json::to_value(&detail)
        .map_err(Error::from)
        .and_then(|d| doc.dispatch_custom(form, BLOCKED_EVENT, d));
    if let Err(e) = outcome {
        tracing::debug!("Dropped blocked-event notification: {}", e);
    }
}

/// Best-effort fake-success presentation for `silent-success` forms
///
/// Contract: never propagates a failure. The block decision stands even
/// when the cosmetic layer cannot be updated.
fn apply_silent_success(doc: &Document, form: NodeId) {
    if let Err(e) = try_silent_success(doc, form) {
        tracing::debug!("Silent-success cover-up incomplete: {}", e);
    }
}

fn try_silent_success(doc: &Document, form: NodeId) -> Result<()> {
    doc.reset_form(form)?;
    if let Some(done) = doc.find_by_class(form, DONE_CLASS) {
        doc.set_style(done, "display", "block")?;
    }
    if let Some(fail) = doc.find_by_class(form, FAIL_CLASS) {
        doc.set_style(fail, "display", "none")?;
    }
    Ok(())
}
