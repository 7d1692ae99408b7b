//! Key-aware redaction of sensitive values in request logs.
//!
//! # Usage
//!
//! ```
//! use reqlog_core::LogValue;
//! use reqlog_observability::scrubber::{sanitize, KeyRedactor, REDACTED};
//!
//! let params: LogValue = serde_json::json!({
//!     "user": {"name": "ada", "password": "hunter2"}
//! }).into();
//! let clean = sanitize(&params, &KeyRedactor::default()).unwrap();
//! assert_eq!(
//!     clean.get("user").and_then(|u| u.get("password")),
//!     Some(&LogValue::from(REDACTED))
//! );
//! ```

use regex::{Regex, RegexBuilder};
use reqlog_core::{LogValue, ReqlogError};
use std::collections::BTreeMap;

/// Replacement string used for all redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Structures nested deeper than this are rejected by [`sanitize`].
pub const MAX_DEPTH: usize = 64;

/// A redaction function.
///
/// Called once per map entry with the enclosing key, and once per list
/// element or bare scalar with `None`. Returns the value to keep.
pub trait Sanitizer: Send + Sync {
    fn redact(&self, key: Option<&str>, value: LogValue) -> LogValue;
}

impl<F> Sanitizer for F
where
    F: Fn(Option<&str>, LogValue) -> LogValue + Send + Sync,
{
    fn redact(&self, key: Option<&str>, value: LogValue) -> LogValue {
        self(key, value)
    }
}

// ─────────────────────────────────────────────────────────────
// Default policy
// ─────────────────────────────────────────────────────────────

/// Redacts the value of any key matching one of its patterns.
///
/// Patterns are compiled case-insensitively, so `password` also catches
/// `Password`, `user_password`, `PASSWORD_CONFIRMATION`.
#[derive(Debug, Clone)]
pub struct KeyRedactor {
    patterns: Vec<Regex>,
}

impl KeyRedactor {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: compile_patterns(patterns),
        }
    }

    /// Whether `key` matches any pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(key))
    }
}

impl Default for KeyRedactor {
    fn default() -> Self {
        Self::new(&["password".to_string()])
    }
}

impl Sanitizer for KeyRedactor {
    fn redact(&self, key: Option<&str>, value: LogValue) -> LogValue {
        match key {
            Some(k) if self.matches(k) => LogValue::from(REDACTED),
            _ => value,
        }
    }
}

/// Compile pattern strings case-insensitively, ignoring invalid patterns
/// (logs a warning and skips).
pub fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| tracing::warn!("invalid redaction pattern {:?}: {}", p, e))
                .ok()
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────
// Traversal
// ─────────────────────────────────────────────────────────────

/// Return a redacted copy of `input`.
///
/// Maps: each value is passed through the sanitizer with its key, and the
/// result is walked again. Lists: each element is passed through with no key,
/// then walked. Scalars: passed through with no key.
pub fn sanitize(input: &LogValue, sanitizer: &dyn Sanitizer) -> Result<LogValue, ReqlogError> {
    walk(input.clone(), sanitizer, 0)
}

fn walk(input: LogValue, sanitizer: &dyn Sanitizer, depth: usize) -> Result<LogValue, ReqlogError> {
    if depth > MAX_DEPTH {
        return Err(ReqlogError::NestingTooDeep { limit: MAX_DEPTH });
    }
    match input {
        LogValue::Map(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                let redacted = sanitizer.redact(Some(&k), v);
                let walked = walk(redacted, sanitizer, depth + 1)?;
                out.insert(k, walked);
            }
            Ok(LogValue::Map(out))
        }
        LogValue::List(items) => items
            .into_iter()
            .map(|v| walk(sanitizer.redact(None, v), sanitizer, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(LogValue::List),
        scalar => Ok(sanitizer.redact(None, scalar)),
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
