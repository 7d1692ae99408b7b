use crate::value::LogValue;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::time::Instant;

/// The per-request log record, filled in across the request lifecycle.
///
/// Timestamps are write-once: `start_time` is captured on first access and
/// `end_time` on the first call to [`LogRecord::finish`]. `end_time` is
/// derived from the monotonic clock, so `runtime` can never go negative even
/// if the wall clock steps backwards mid-request.
#[derive(Debug, Clone)]
pub struct LogRecord {
    render_json: bool,
    start: Option<(DateTime<Utc>, Instant)>,
    end_time: Option<DateTime<Utc>>,

    pub request_method: Option<String>,
    pub path: Option<String>,
    /// Route identifier ("processed by").
    pub processed: Option<String>,
    pub parameters: Option<LogValue>,
    pub headers: Option<LogValue>,
    pub remote_ip: Option<String>,
    pub trace_id: Option<String>,
    pub status: Option<u16>,
    /// `"<Type>: <message>"` of a raised exception.
    pub exception: Option<String>,
    /// Message carried by a framework-level error signal.
    pub message: Option<String>,
}

impl LogRecord {
    pub fn new(render_json: bool) -> Self {
        Self {
            render_json,
            start: None,
            end_time: None,
            request_method: None,
            path: None,
            processed: None,
            parameters: None,
            headers: None,
            remote_ip: None,
            trace_id: None,
            status: None,
            exception: None,
            message: None,
        }
    }

    /// Whether this record renders as a single JSON object.
    #[inline]
    pub fn render_json(&self) -> bool {
        self.render_json
    }

    /// Start time, captured on first access.
    pub fn start_time(&mut self) -> DateTime<Utc> {
        self.start.get_or_insert_with(|| (Utc::now(), Instant::now())).0
    }

    /// Start time if it has been captured.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start.map(|(t, _)| t)
    }

    /// Capture `end_time`. Later calls return the first value unchanged.
    pub fn finish(&mut self) -> DateTime<Utc> {
        if let Some(end) = self.end_time {
            return end;
        }
        self.start_time();
        let (wall, mono) = match self.start {
            Some(start) => start,
            None => return Utc::now(),
        };
        let elapsed = TimeDelta::from_std(mono.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        let end = wall + elapsed;
        self.end_time = Some(end);
        end
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// `end_time - start_time` in milliseconds, rounded to two decimals.
    pub fn runtime_ms(&self) -> Option<f64> {
        let start = self.started_at()?;
        let end = self.end_time?;
        Some(runtime_between(start, end))
    }

    /// Record a raised exception as `"<kind>: <message>"`.
    pub fn set_exception(&mut self, kind: &str, message: &str) {
        self.exception = Some(format!("{kind}: {message}"));
    }

    /// Map view of the record. Absent optional fields are omitted.
    pub fn to_value(&self) -> LogValue {
        let mut m: BTreeMap<String, LogValue> = BTreeMap::new();
        m.insert("render_json".into(), LogValue::Bool(self.render_json));

        if let Some(start) = self.started_at() {
            m.insert("start_time".into(), LogValue::Timestamp(start));
        }
        if let Some(end) = self.end_time {
            m.insert("end_time".into(), LogValue::Timestamp(end));
        }
        if let Some(runtime) = self.runtime_ms() {
            m.insert("runtime".into(), LogValue::Float(runtime));
        }

        let strings = [
            ("request_method", &self.request_method),
            ("path", &self.path),
            ("processed", &self.processed),
            ("remote_ip", &self.remote_ip),
            ("trace_id", &self.trace_id),
            ("exception", &self.exception),
            ("message", &self.message),
        ];
        for (key, value) in strings {
            if let Some(v) = value {
                m.insert(key.into(), LogValue::String(v.clone()));
            }
        }

        if let Some(params) = &self.parameters {
            m.insert("parameters".into(), params.clone());
        }
        if let Some(headers) = &self.headers {
            m.insert("headers".into(), headers.clone());
        }
        if let Some(status) = self.status {
            m.insert("status".into(), LogValue::from(status));
        }

        LogValue::Map(m)
    }
}

/// Milliseconds between two instants, clamped at zero and rounded to two decimals.
pub fn runtime_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let micros = (end - start).num_microseconds().unwrap_or(i64::MAX).max(0);
    round_ms(micros as f64 / 1000.0)
}

/// Round a millisecond value to two decimal places.
#[inline]
pub fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
