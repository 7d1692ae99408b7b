use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide logger defaults, loaded once at wiring time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Render each log group as a single JSON object.
    #[serde(default)]
    pub render_json: bool,
    /// Which request headers to capture.
    #[serde(default)]
    pub headers: HeaderCapture,
    /// Parameter keys (substring, case-insensitive) replaced with `[FILTERED]`.
    /// Empty = no parameter filter.
    #[serde(default)]
    pub filter_parameters: Vec<String>,
    /// Key patterns (regex, case-insensitive) whose values the sanitizer redacts.
    #[serde(default = "default_redact_keys")]
    pub redact_keys: Vec<String>,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Header capture policy.
///
/// In YAML: `none`, `all`, or a list of header names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HeaderCaptureRepr", into = "HeaderCaptureRepr")]
pub enum HeaderCapture {
    #[default]
    None,
    List(Vec<String>),
    All,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HeaderCaptureRepr {
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<HeaderCaptureRepr> for HeaderCapture {
    type Error = String;

    fn try_from(repr: HeaderCaptureRepr) -> Result<Self, Self::Error> {
        match repr {
            HeaderCaptureRepr::Keyword(k) => match k.to_ascii_lowercase().as_str() {
                "none" | "" => Ok(HeaderCapture::None),
                "all" => Ok(HeaderCapture::All),
                other => Err(format!(
                    "unknown header capture mode {other:?} (expected \"none\", \"all\" or a list)"
                )),
            },
            HeaderCaptureRepr::List(names) if names.is_empty() => Ok(HeaderCapture::None),
            HeaderCaptureRepr::List(names) => Ok(HeaderCapture::List(names)),
        }
    }
}

impl From<HeaderCapture> for HeaderCaptureRepr {
    fn from(capture: HeaderCapture) -> Self {
        match capture {
            HeaderCapture::None => HeaderCaptureRepr::Keyword("none".into()),
            HeaderCapture::All => HeaderCaptureRepr::Keyword("all".into()),
            HeaderCapture::List(names) => HeaderCaptureRepr::List(names),
        }
    }
}

impl HeaderCapture {
    /// Whether any headers are captured at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, HeaderCapture::None)
    }
}

/// Where request log lines are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// `tracing` info events (target `reqlog`).
    #[default]
    Tracing,
    /// Plain lines on standard output.
    Stdout,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_redact_keys() -> Vec<String> { vec!["password".into()] }

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            render_json: false,
            headers: HeaderCapture::None,
            filter_parameters: Vec::new(),
            redact_keys: default_redact_keys(),
            sink: SinkConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Load configuration from a YAML file + `REQLOG_` env overrides.
    ///
    /// Nested keys use a double underscore: `REQLOG_SINK__TYPE=stdout`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: LoggerConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("REQLOG_").split("__"))
            .extract()?;
        Ok(config)
    }
}
