use reqlog_core::LogValue;
use reqlog_observability::scrubber::MAX_DEPTH;
use std::collections::BTreeMap;

/// Replacement for filtered parameter values.
pub const FILTERED: &str = "[FILTERED]";

/// Filters request parameters before they are recorded.
///
/// Runs before the sanitizer; the sanitizer then sees the filtered values.
pub trait ParameterFilter: Send + Sync {
    fn filter(&self, params: BTreeMap<String, LogValue>) -> BTreeMap<String, LogValue>;
}

/// Replaces the value of every key containing one of the configured
/// fragments (case-insensitive), at any depth.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    fragments: Vec<String>,
}

impl KeyFilter {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(|f| f.as_ref().trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn is_filtered(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.fragments.iter().any(|f| key.contains(f.as_str()))
    }

    fn filter_value(&self, value: LogValue, depth: usize) -> LogValue {
        // Too deep to walk; the sanitizer rejects it later
        if depth > MAX_DEPTH {
            return value;
        }
        match value {
            LogValue::Map(map) => LogValue::Map(self.filter_map(map, depth + 1)),
            LogValue::List(items) => LogValue::List(
                items
                    .into_iter()
                    .map(|v| self.filter_value(v, depth + 1))
                    .collect(),
            ),
            other => other,
        }
    }

    fn filter_map(&self, map: BTreeMap<String, LogValue>, depth: usize) -> BTreeMap<String, LogValue> {
        map.into_iter()
            .map(|(k, v)| {
                let v = if self.is_filtered(&k) {
                    LogValue::from(FILTERED)
                } else {
                    self.filter_value(v, depth)
                };
                (k, v)
            })
            .collect()
    }
}

impl ParameterFilter for KeyFilter {
    fn filter(&self, params: BTreeMap<String, LogValue>) -> BTreeMap<String, LogValue> {
        self.filter_map(params, 0)
    }
}
