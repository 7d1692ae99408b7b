use crate::recorder::LogPhase;
use http::Method;
use reqlog_core::{LogRecord, LogValue};
use reqlog_observability::{LogSink, Sanitizer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Endpoint metadata supplied by the host router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Mount namespace; `/` for the root.
    pub namespace: String,
    /// Declared path segments, e.g. `["widgets", "/:id"]`.
    pub path: Vec<String>,
    /// Name of the API type that owns the endpoint, e.g. `WidgetsAPI`.
    pub owner: String,
}

impl RouteInfo {
    pub fn new(namespace: impl Into<String>, path: Vec<String>, owner: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path,
            owner: owner.into(),
        }
    }
}

/// A finished record handed from the logger to a later stage of the same
/// request, together with the sink and sanitizer needed to re-emit it.
pub struct LogHandoff {
    pub record: LogRecord,
    pub sink: Arc<dyn LogSink>,
    pub sanitizer: Arc<dyn Sanitizer>,
    /// Phase the logger finished in, or `Published` once rewritten.
    pub phase: LogPhase,
}

impl fmt::Debug for LogHandoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandoff")
            .field("record", &self.record)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Per-request context passed down the middleware stack.
///
/// The host framework fills in the request data; the log slot is written
/// by [`RequestLogger`](crate::RequestLogger) when it completes and read by
/// at most one later collaborator ([`HeadOverride`](crate::HeadOverride)).
#[derive(Debug)]
pub struct RequestEnv {
    pub method: Method,
    pub path: String,
    /// Route/query parameters.
    pub params: BTreeMap<String, LogValue>,
    /// Form-encoded body parameters, when the body was a form.
    pub form_params: Option<BTreeMap<String, LogValue>>,
    /// Parameters parsed from a structured (e.g. JSON) request body.
    pub body_params: Option<BTreeMap<String, LogValue>>,
    pub headers: BTreeMap<String, String>,
    pub remote_addr: String,
    pub trace_id: Option<String>,
    pub route: Option<RouteInfo>,

    log_slot: Option<LogHandoff>,
}

impl RequestEnv {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            form_params: None,
            body_params: None,
            headers: BTreeMap::new(),
            remote_addr: String::new(),
            trace_id: None,
            route: None,
            log_slot: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<LogValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_route(mut self, route: RouteInfo) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_body_params(mut self, params: BTreeMap<String, LogValue>) -> Self {
        self.body_params = Some(params);
        self
    }

    pub fn with_form_params(mut self, params: BTreeMap<String, LogValue>) -> Self {
        self.form_params = Some(params);
        self
    }

    /// Get a request header (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Route params merged with form params, then body params.
    /// Later sources win on key collisions.
    pub fn request_params(&self) -> BTreeMap<String, LogValue> {
        let mut merged = self.params.clone();
        for extra in [&self.form_params, &self.body_params].into_iter().flatten() {
            merged.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    // ── Log handoff slot ─────────────────────────────────────────

    /// Store the finished record for a later stage. Replaces any earlier one.
    pub fn publish_log(&mut self, handoff: LogHandoff) {
        self.log_slot = Some(handoff);
    }

    pub fn published_log(&self) -> Option<&LogHandoff> {
        self.log_slot.as_ref()
    }

    /// Take the published record out of the slot.
    pub fn take_log(&mut self) -> Option<LogHandoff> {
        self.log_slot.take()
    }
}
