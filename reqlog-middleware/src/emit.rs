use reqlog_core::{LogRecord, LogValue};
use reqlog_observability::scrubber::{self, REDACTED};
use reqlog_observability::{render, LogSink, Sanitizer};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Started,
    Completed,
    Rewritten,
}

pub(crate) fn emit_started(sink: &dyn LogSink, sanitizer: &dyn Sanitizer, record: &LogRecord) {
    emit(sink, sanitizer, record, Group::Started);
}

pub(crate) fn emit_completed(sink: &dyn LogSink, sanitizer: &dyn Sanitizer, record: &LogRecord) {
    emit(sink, sanitizer, record, Group::Completed);
}

pub(crate) fn emit_rewritten(sink: &dyn LogSink, sanitizer: &dyn Sanitizer, record: &LogRecord) {
    emit(sink, sanitizer, record, Group::Rewritten);
}

fn emit(sink: &dyn LogSink, sanitizer: &dyn Sanitizer, record: &LogRecord, group: Group) {
    let value = sanitized(sanitizer, record);

    let lines = if record.render_json() {
        match render::json_line(&value) {
            Ok(line) => vec![line],
            Err(e) => {
                warn!(error = %e, "failed to serialize request log record");
                return;
            }
        }
    } else {
        match group {
            Group::Started => render::started_lines(&value),
            Group::Completed => render::completed_lines(&value),
            Group::Rewritten => render::rewritten_lines(&value),
        }
    };

    for line in &lines {
        if let Err(e) = sink.write_line(line) {
            warn!(error = %e, "request log sink write failed");
            return;
        }
    }
}

/// Sanitized map view of `record`. Each top-level field is redacted and
/// walked on its own, so the nesting limit applies to the field value itself.
/// A field that fails is replaced with the redaction marker.
fn sanitized(sanitizer: &dyn Sanitizer, record: &LogRecord) -> LogValue {
    let LogValue::Map(fields) = record.to_value() else {
        return LogValue::map();
    };
    let fields = fields
        .into_iter()
        .map(|(key, field)| {
            let redacted = sanitizer.redact(Some(key.as_str()), field);
            let clean = match scrubber::sanitize(&redacted, sanitizer) {
                Ok(clean) => clean,
                Err(e) => {
                    warn!(error = %e, kind = e.kind(), field = %key, "request log field sanitize failed");
                    LogValue::from(REDACTED)
                }
            };
            (key, clean)
        })
        .collect();
    LogValue::Map(fields)
}
