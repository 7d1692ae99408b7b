use crate::app::Exception;
use crate::filter::{KeyFilter, ParameterFilter};
use reqlog_core::{HeaderCapture, LoggerConfig};
use reqlog_observability::sink::{self, LogSink, TracingSink};
use reqlog_observability::{KeyRedactor, Sanitizer};
use std::fmt;
use std::sync::Arc;

/// Transforms an exception before it is logged and re-raised.
pub type ExceptionHook = Arc<dyn Fn(Exception) -> Exception + Send + Sync>;

/// Process-wide logger defaults.
///
/// Built once at wiring time and passed to each [`RequestLogger`](crate::RequestLogger).
#[derive(Clone)]
pub struct Defaults {
    pub sink: Arc<dyn LogSink>,
    pub headers: HeaderCapture,
    pub filter: Option<Arc<dyn ParameterFilter>>,
    pub sanitizer: Arc<dyn Sanitizer>,
    pub render_json: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            sink: Arc::new(TracingSink),
            headers: HeaderCapture::None,
            filter: None,
            sanitizer: Arc::new(KeyRedactor::default()),
            render_json: false,
        }
    }
}

impl Defaults {
    /// Build defaults from loaded configuration.
    pub fn from_config(config: &LoggerConfig) -> Self {
        let filter = KeyFilter::new(&config.filter_parameters);
        let filter: Option<Arc<dyn ParameterFilter>> = if filter.is_empty() {
            None
        } else {
            Some(Arc::new(filter))
        };

        Self {
            sink: sink::from_config(&config.sink),
            headers: config.headers.clone(),
            filter,
            sanitizer: Arc::new(KeyRedactor::new(&config.redact_keys)),
            render_json: config.render_json,
        }
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("headers", &self.headers)
            .field("filter", &self.filter.is_some())
            .field("render_json", &self.render_json)
            .finish_non_exhaustive()
    }
}

/// Per-instance overrides. Unset fields fall back to [`Defaults`].
#[derive(Clone, Default)]
pub struct Options {
    pub sink: Option<Arc<dyn LogSink>>,
    pub headers: Option<HeaderCapture>,
    pub filter: Option<Arc<dyn ParameterFilter>>,
    pub sanitizer: Option<Arc<dyn Sanitizer>>,
    pub render_json: Option<bool>,
    pub around_exception: Option<ExceptionHook>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn headers(mut self, headers: HeaderCapture) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn filter(mut self, filter: Arc<dyn ParameterFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    pub fn render_json(mut self, render_json: bool) -> Self {
        self.render_json = Some(render_json);
        self
    }

    pub fn around_exception<F>(mut self, hook: F) -> Self
    where
        F: Fn(Exception) -> Exception + Send + Sync + 'static,
    {
        self.around_exception = Some(Arc::new(hook));
        self
    }
}

/// Options resolved against defaults; read-only for the logger's lifetime.
pub(crate) struct Settings {
    pub sink: Arc<dyn LogSink>,
    pub headers: HeaderCapture,
    pub filter: Option<Arc<dyn ParameterFilter>>,
    pub sanitizer: Arc<dyn Sanitizer>,
    pub render_json: bool,
    pub around_exception: Option<ExceptionHook>,
}

impl Settings {
    pub fn resolve(defaults: &Defaults, options: Options) -> Self {
        Self {
            sink: options.sink.unwrap_or_else(|| Arc::clone(&defaults.sink)),
            headers: options.headers.unwrap_or_else(|| defaults.headers.clone()),
            filter: options.filter.or_else(|| defaults.filter.clone()),
            sanitizer: options
                .sanitizer
                .unwrap_or_else(|| Arc::clone(&defaults.sanitizer)),
            render_json: options.render_json.unwrap_or(defaults.render_json),
            around_exception: options.around_exception,
        }
    }
}
