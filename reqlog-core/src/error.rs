use thiserror::Error;

/// Unified error type for reqlog.
///
/// None of these may fail a request: the middleware reports them through
/// `tracing` and carries on.
#[derive(Error, Debug)]
pub enum ReqlogError {
    #[error("Value nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ReqlogError {
    /// Short machine-readable label, used as a structured `tracing` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ReqlogError::NestingTooDeep { .. } => "nesting_too_deep",
            ReqlogError::Io(_) => "io",
            ReqlogError::Serde(_) => "serde",
        }
    }
}
