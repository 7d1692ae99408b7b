use crate::app::{App, ErrorSignal, Exception, Halt, Response};
use crate::emit::{emit_completed, emit_started};
use crate::env::{LogHandoff, RequestEnv};
use crate::headers::select_headers;
use crate::options::{Defaults, Options, Settings};
use crate::route::processed_by;
use async_trait::async_trait;
use reqlog_core::{LogRecord, LogValue};
use std::fmt;
use std::sync::Arc;

/// Phase of a published log record.
///
/// A handoff is only published once the completed group has been emitted;
/// the earlier idle and started states last only for the duration of
/// [`RequestLogger`]'s call and are never observable in the env.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogPhase {
    /// Downstream returned a response.
    Completed,
    /// Downstream signalled an [`ErrorSignal`].
    Failed,
    /// Downstream raised an [`Exception`].
    Excepted,
    /// A later stage rewrote and re-emitted the record.
    Published,
}

impl LogPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogPhase::Completed => "completed",
            LogPhase::Failed => "failed",
            LogPhase::Excepted => "excepted",
            LogPhase::Published => "published",
        }
    }
}

impl fmt::Display for LogPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Middleware that records and emits a log record around every call to the
/// wrapped app.
///
/// The "started" group is emitted before the app runs and the "completed"
/// group once it returns, raises, or signals. Raised exceptions and error
/// signals are re-propagated unchanged (after the `around_exception` hook).
pub struct RequestLogger<A> {
    app: A,
    settings: Settings,
}

impl<A: App> RequestLogger<A> {
    pub fn new(app: A, defaults: &Defaults, options: Options) -> Self {
        Self {
            app,
            settings: Settings::resolve(defaults, options),
        }
    }

    fn before(&self, env: &RequestEnv) -> LogRecord {
        let mut record = LogRecord::new(self.settings.render_json);
        record.start_time();
        record.request_method = Some(env.method.as_str().to_string());
        record.path = Some(env.path.clone());
        record.processed = Some(env.route.as_ref().map(processed_by).unwrap_or_default());

        let params = env.request_params();
        let params = match &self.settings.filter {
            Some(filter) => filter.filter(params),
            None => params,
        };
        record.parameters = Some(LogValue::Map(params));

        if self.settings.headers.is_enabled() {
            record.headers = Some(select_headers(&env.headers, &self.settings.headers).into());
        }
        record.remote_ip = Some(env.remote_addr.clone());
        record.trace_id = env.trace_id.clone();

        emit_started(
            self.settings.sink.as_ref(),
            self.settings.sanitizer.as_ref(),
            &record,
        );
        record
    }

    fn finalize(&self, env: &mut RequestEnv, mut record: LogRecord, phase: LogPhase) {
        record.finish();
        emit_completed(
            self.settings.sink.as_ref(),
            self.settings.sanitizer.as_ref(),
            &record,
        );
        env.publish_log(LogHandoff {
            record,
            sink: Arc::clone(&self.settings.sink),
            sanitizer: Arc::clone(&self.settings.sanitizer),
            phase,
        });
    }

    fn on_response(&self, env: &mut RequestEnv, mut record: LogRecord, response: &Response) {
        record.status = Some(response.status);
        self.finalize(env, record, LogPhase::Completed);
    }

    fn on_exception(&self, env: &mut RequestEnv, mut record: LogRecord, exception: Exception) -> Exception {
        let exception = match &self.settings.around_exception {
            Some(hook) => hook(exception),
            None => exception,
        };
        record.set_exception(exception.kind(), exception.message());
        record.status = Some(500);
        self.finalize(env, record, LogPhase::Excepted);
        exception
    }

    fn on_signal(&self, env: &mut RequestEnv, mut record: LogRecord, signal: &ErrorSignal) {
        record.status = Some(signal.status);
        record.message = signal.message.clone();
        self.finalize(env, record, LogPhase::Failed);
    }
}

#[async_trait]
impl<A: App> App for RequestLogger<A> {
    async fn call(&self, env: &mut RequestEnv) -> Result<Response, Halt> {
        let record = self.before(env);

        match self.app.call(env).await {
            Ok(response) => {
                self.on_response(env, record, &response);
                Ok(response)
            }
            Err(Halt::Exception(exception)) => {
                let exception = self.on_exception(env, record, exception);
                Err(Halt::Exception(exception))
            }
            Err(Halt::Error(signal)) => {
                self.on_signal(env, record, &signal);
                Err(Halt::Error(signal))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names() {
        assert_eq!(LogPhase::Excepted.to_string(), "excepted");
        assert_eq!(LogPhase::Published.as_str(), "published");
        assert_eq!(LogPhase::Failed.to_string(), "failed");
    }
}
