use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Format used for timestamps in text log lines, e.g. `2026-10-14 09:30:00 +0000`.
pub const TEXT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// A heterogeneous log value.
///
/// Request parameters, headers, and the assembled record itself are all
/// expressed with this type so that one sanitizer can walk any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Serialised as RFC 3339.
    Timestamp(DateTime<Utc>),
    Map(BTreeMap<String, LogValue>),
    List(Vec<LogValue>),
}

impl LogValue {
    /// Empty map.
    pub fn map() -> Self {
        LogValue::Map(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LogValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LogValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, LogValue>> {
        match self {
            LogValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&LogValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Whether this value carries nothing worth printing
    /// (null, empty string, empty map or list).
    pub fn is_blank(&self) -> bool {
        match self {
            LogValue::Null => true,
            LogValue::String(s) => s.is_empty(),
            LogValue::Map(m) => m.is_empty(),
            LogValue::List(l) => l.is_empty(),
            _ => false,
        }
    }

    /// Render for a text log line: strings raw, timestamps in
    /// [`TEXT_TIME_FORMAT`], everything else as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            LogValue::Null => String::new(),
            LogValue::String(s) => s.clone(),
            LogValue::Timestamp(t) => t.format(TEXT_TIME_FORMAT).to_string(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::String(s.to_string())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::String(s)
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

impl From<i64> for LogValue {
    fn from(n: i64) -> Self {
        LogValue::Int(n)
    }
}

impl From<i32> for LogValue {
    fn from(n: i32) -> Self {
        LogValue::Int(n.into())
    }
}

impl From<u16> for LogValue {
    fn from(n: u16) -> Self {
        LogValue::Int(n.into())
    }
}

impl From<f64> for LogValue {
    fn from(n: f64) -> Self {
        LogValue::Float(n)
    }
}

impl From<DateTime<Utc>> for LogValue {
    fn from(t: DateTime<Utc>) -> Self {
        LogValue::Timestamp(t)
    }
}

impl From<BTreeMap<String, LogValue>> for LogValue {
    fn from(m: BTreeMap<String, LogValue>) -> Self {
        LogValue::Map(m)
    }
}

impl From<BTreeMap<String, String>> for LogValue {
    fn from(m: BTreeMap<String, String>) -> Self {
        LogValue::Map(m.into_iter().map(|(k, v)| (k, LogValue::String(v))).collect())
    }
}

impl From<Vec<LogValue>> for LogValue {
    fn from(v: Vec<LogValue>) -> Self {
        LogValue::List(v)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(LogValue::Null)
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => LogValue::Null,
            Value::Bool(b) => LogValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => LogValue::Int(i),
                None => LogValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => LogValue::String(s),
            Value::Array(items) => LogValue::List(items.into_iter().map(LogValue::from).collect()),
            Value::Object(obj) => {
                LogValue::Map(obj.into_iter().map(|(k, v)| (k, LogValue::from(v))).collect())
            }
        }
    }
}
