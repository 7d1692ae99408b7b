//! Request fixtures replayed through the middleware stack.

use anyhow::Context;
use http::Method;
use reqlog_core::LogValue;
use reqlog_middleware::RequestEnv;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Header carrying the request's trace id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const SAMPLE: &str = r#"
- method: GET
  path: /widgets
  headers:
    Accept: application/json
- method: GET
  path: /widgets/2
  trace_id: demo-trace-1
- method: GET
  path: /widgets/99
- method: POST
  path: /widgets
  headers:
    Content-Type: application/json
  body:
    name: cog
    owner:
      email: ada@example.com
      password: hunter2
- method: POST
  path: /widgets
  body: {}
- method: HEAD
  path: /widgets/3
- method: DELETE
  path: /widgets/1
"#;

/// One request to replay.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRequest {
    pub method: String,
    pub path: String,

    /// Query parameters.
    #[serde(default)]
    pub query: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// JSON body; objects become body params.
    #[serde(default)]
    pub body: Option<serde_json::Value>,

    /// Form-encoded body fields.
    #[serde(default)]
    pub form: Option<BTreeMap<String, String>>,

    #[serde(default = "default_remote_addr")]
    pub remote_addr: String,

    #[serde(default)]
    pub trace_id: Option<String>,
}

fn default_remote_addr() -> String {
    "127.0.0.1".to_string()
}

impl ReplayRequest {
    /// Build the request context. A request without a trace id gets a fresh
    /// `X-Request-Id` header, and that header becomes the trace id.
    pub fn into_env(self) -> anyhow::Result<RequestEnv> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("invalid method {:?}", self.method))?;

        let mut env = RequestEnv::new(method, self.path).with_remote_addr(self.remote_addr);
        env.headers = self.headers;
        for (key, value) in self.query {
            env.params.insert(key, LogValue::from(value));
        }

        if let Some(body) = self.body {
            match LogValue::from(body) {
                LogValue::Map(params) => env.body_params = Some(params),
                other => tracing::debug!(body = %other.to_text(), "non-object body ignored"),
            }
        }
        if let Some(form) = self.form {
            env.form_params = Some(
                form.into_iter()
                    .map(|(k, v)| (k, LogValue::from(v)))
                    .collect(),
            );
        }

        let trace_id = match self.trace_id {
            Some(id) => id,
            None => match env.get_header(REQUEST_ID_HEADER) {
                Some(id) => id.to_string(),
                None => {
                    let id = uuid::Uuid::new_v4().to_string();
                    env.headers.insert(REQUEST_ID_HEADER.to_string(), id.clone());
                    id
                }
            },
        };
        env.trace_id = Some(trace_id);
        Ok(env)
    }
}

/// Read a YAML list of requests.
pub fn load_requests(path: &Path) -> anyhow::Result<Vec<ReplayRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_requests(&content)
}

pub fn parse_requests(yaml: &str) -> anyhow::Result<Vec<ReplayRequest>> {
    let requests = serde_yaml::from_str(yaml).context("parsing request fixtures")?;
    Ok(requests)
}

/// The built-in request set used when no fixture file is given.
pub fn sample_requests() -> anyhow::Result<Vec<ReplayRequest>> {
    parse_requests(SAMPLE)
}
