//! # Birdlime
//!
//! Drop-in honeypot and timing guard that keeps bots out of HTML forms.
//!
//! Birdlime arms opted-in forms with two independent heuristics: a hidden
//! honeypot input that only automated form-fillers are likely to touch,
//! and a minimum elapsed-time threshold between render and submit. Both
//! are evaluated synchronously inside a capture-phase submission
//! interceptor; a caught bot is either blocked outright or shown a fake
//! success, per form configuration.
//!
//! ## Features
//!
//! - **Zero Markup Changes** - One `data-honeypot` attribute opts a form in
//! - **Hardened Honeypot** - Hidden off-viewport, skipped by tab order,
//!   assistive technology, and credential managers
//! - **Fail-Open** - Degrades to a no-op rather than breaking the page
//! - **Observable** - Blocked submissions dispatch a structured
//!   `honeypot:blocked` event
//!
//! ## Quick Start
//!
//! ```rust
//! use birdlime::{Document, Guard};
//!
//! fn main() -> birdlime::Result<()> {
//!     let doc = Document::new();
//!     let form = doc.create_element("form");
//!     doc.set_attribute(form, "data-honeypot", "")?;
//!     doc.append_child(doc.body(), form)?;
//!
//!     // Arm every opted-in form (style rule, honeypot field, interceptor)
//!     let guard = Guard::new();
//!     guard.install(&doc);
//!
//!     // A submit this fast is not human
//!     let event = doc.request_submit(form)?;
//!     assert!(event.default_prevented());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use birdlime::{FormPolicy, Guard, GuardConfig};
//!
//! let config = GuardConfig {
//!     hide_class: "visually-hidden".into(),
//!     defaults: FormPolicy {
//!         min_submit_ms: 2000,
//!         ..FormPolicy::default()
//!     },
//!     ..GuardConfig::default()
//! };
//!
//! let guard = Guard::with_config(config);
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod guard;
pub mod style;

// Re-exports
pub use config::{Behavior, FormPolicy, DEFAULT_FIELD_NAME, DEFAULT_MIN_SUBMIT_MS};
pub use dom::{Document, DocumentId, Event, NodeId, ReadyState};
pub use error::{Error, Result};
pub use guard::{BlockedDetail, Guard, Verdict, BLOCKED_EVENT};
pub use style::{StyleInstaller, STYLE_MARKER_ATTR};

/// Crate version, exposed for host pages that want to report it
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for the form guard
///
/// The defaults reproduce the documented markup contract; override pieces
/// with struct-update syntax.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Boolean marker attribute that opts a form in
    pub marker_attr: String,
    /// Attribute naming the honeypot field
    pub field_attr: String,
    /// Attribute selecting the response behavior
    pub behavior_attr: String,
    /// Attribute carrying the minimum submit time in milliseconds
    pub min_time_attr: String,
    /// Class applied to honeypot fields; the installed style rule hides it
    pub hide_class: String,
    /// Per-form defaults used when attributes are absent or unparsable
    pub defaults: FormPolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            marker_attr: "data-honeypot".to_string(),
            field_attr: "data-honeypot-field".to_string(),
            behavior_attr: "data-honeypot-behavior".to_string(),
            min_time_attr: "data-honeypot-min-time".to_string(),
            hide_class: "hp-field".to_string(),
            defaults: FormPolicy::default(),
        }
    }
}

impl GuardConfig {
    /// Create a config whose forms default to the silent-success response
    pub fn silent() -> Self {
        Self {
            defaults: FormPolicy {
                behavior: Behavior::SilentSuccess,
                ..FormPolicy::default()
            },
            ..Default::default()
        }
    }
}
