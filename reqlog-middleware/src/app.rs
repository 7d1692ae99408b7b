use crate::env::RequestEnv;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Response produced by the downstream application.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// JSON response with `content-type: application/json`.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// A failure raised by downstream processing.
///
/// `kind` names the failure type (the exception class); `message` is its
/// human-readable description.
#[derive(Debug)]
pub struct Exception {
    kind: String,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Exception {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an error, taking `kind` from its type name (`ParseIntError`, …).
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind: short_type_name::<E>().to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// `core::num::error::ParseIntError` → `ParseIntError`.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A framework-level error signal: a non-local exit carrying a status and
/// an optional message, distinct from a raised [`Exception`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSignal {
    pub status: u16,
    pub message: Option<String>,
}

impl ErrorSignal {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => write!(f, "error {}: {}", self.status, m),
            None => write!(f, "error {}", self.status),
        }
    }
}

impl std::error::Error for ErrorSignal {}

/// How a downstream call can end other than with a response.
#[derive(Debug, thiserror::Error)]
pub enum Halt {
    /// Raised failure; logged as status 500.
    #[error(transparent)]
    Exception(#[from] Exception),

    /// Framework-level error signal.
    #[error(transparent)]
    Error(#[from] ErrorSignal),
}

impl Halt {
    /// Status the failure is logged with.
    pub fn status(&self) -> u16 {
        match self {
            Halt::Exception(_) => 500,
            Halt::Error(signal) => signal.status,
        }
    }
}

/// A request handler: the downstream application, or a middleware wrapping one.
#[async_trait]
pub trait App: Send + Sync {
    async fn call(&self, env: &mut RequestEnv) -> Result<Response, Halt>;
}

#[async_trait]
impl<A: App + ?Sized> App for Arc<A> {
    async fn call(&self, env: &mut RequestEnv) -> Result<Response, Halt> {
        (**self).call(env).await
    }
}
