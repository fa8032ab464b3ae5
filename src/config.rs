//! Per-Form Policy
//!
//! Resolves the raw attribute strings declared on a form into a validated
//! policy. Resolution is a pure function with documented defaults, so the
//! parsing rules are testable without any document.

use serde::Serialize;

/// Field name used when a form declares none
pub const DEFAULT_FIELD_NAME: &str = "_hp_field";

/// Minimum human-plausible submit time used when a form declares none
pub const DEFAULT_MIN_SUBMIT_MS: u64 = 1200;

/// Configured response to a detected bot submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Behavior {
    /// Cancel the submission outright
    #[default]
    Block,
    /// Cancel the submission but dress it up as a success
    SilentSuccess,
}

impl Behavior {
    /// Parse the attribute spelling; anything unrecognized is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "block" => Some(Self::Block),
            "silent-success" => Some(Self::SilentSuccess),
            _ => None,
        }
    }
}

/// Resolved per-form policy: honeypot field name, response behavior, and
/// minimum submit time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPolicy {
    pub field_name: String,
    pub behavior: Behavior,
    pub min_submit_ms: u64,
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_FIELD_NAME.to_string(),
            behavior: Behavior::default(),
            min_submit_ms: DEFAULT_MIN_SUBMIT_MS,
        }
    }
}

impl FormPolicy {
    /// Resolve raw attribute values against the built-in defaults
    pub fn resolve(
        field_name: Option<&str>,
        behavior: Option<&str>,
        min_submit: Option<&str>,
    ) -> Self {
        Self::resolve_with(&Self::default(), field_name, behavior, min_submit)
    }

    /// Resolve raw attribute values against caller-supplied defaults
    ///
    /// Absent, empty, or unparsable values fall back to the default;
    /// nothing here ever fails.
    pub fn resolve_with(
        defaults: &Self,
        field_name: Option<&str>,
        behavior: Option<&str>,
        min_submit: Option<&str>,
    ) -> Self {
        let field_name = match field_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => defaults.field_name.clone(),
        };

        let behavior = behavior
            .and_then(Behavior::parse)
            .unwrap_or(defaults.behavior);

        // u64 parsing also rejects negatives, which the attribute contract
        // does not allow
        let min_submit_ms = min_submit
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(defaults.min_submit_ms);

        Self {
            field_name,
            behavior,
            min_submit_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_absent_yields_documented_defaults() {
        let policy = FormPolicy::resolve(None, None, None);
        assert_eq!(policy.field_name, "_hp_field");
        assert_eq!(policy.behavior, Behavior::Block);
        assert_eq!(policy.min_submit_ms, 1200);
    }

    #[test]
    fn test_declared_values_win() {
        let policy = FormPolicy::resolve(Some("website"), Some("silent-success"), Some("3000"));
        assert_eq!(policy.field_name, "website");
        assert_eq!(policy.behavior, Behavior::SilentSuccess);
        assert_eq!(policy.min_submit_ms, 3000);
    }

    #[test]
    fn test_empty_field_name_falls_back() {
        let policy = FormPolicy::resolve(Some(""), None, None);
        assert_eq!(policy.field_name, "_hp_field");
    }

    #[test]
    fn test_unknown_behavior_falls_back() {
        let policy = FormPolicy::resolve(None, Some("quiet"), None);
        assert_eq!(policy.behavior, Behavior::Block);
    }

    #[test]
    fn test_unparsable_min_time_falls_back() {
        for raw in ["fast", "", "12.5", "-200", "1e3"] {
            let policy = FormPolicy::resolve(None, None, Some(raw));
            assert_eq!(policy.min_submit_ms, 1200, "raw: {raw:?}");
        }
    }

    #[test]
    fn test_min_time_tolerates_surrounding_whitespace() {
        let policy = FormPolicy::resolve(None, None, Some(" 250 "));
        assert_eq!(policy.min_submit_ms, 250);
    }

    #[test]
    fn test_zero_min_time_is_valid() {
        let policy = FormPolicy::resolve(None, None, Some("0"));
        assert_eq!(policy.min_submit_ms, 0);
    }

    #[test]
    fn test_caller_defaults_apply() {
        let defaults = FormPolicy {
            field_name: "url".to_string(),
            behavior: Behavior::SilentSuccess,
            min_submit_ms: 500,
        };
        let policy = FormPolicy::resolve_with(&defaults, None, Some("nonsense"), Some("x"));
        assert_eq!(policy.field_name, "url");
        assert_eq!(policy.behavior, Behavior::SilentSuccess);
        assert_eq!(policy.min_submit_ms, 500);
    }
}
