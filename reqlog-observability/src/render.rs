//! Text and JSON rendering of a (sanitized) request log record.
//!
//! All functions take the map view produced by `LogRecord::to_value`,
//! after it has been through the sanitizer.

use reqlog_core::LogValue;

fn field(record: &LogValue, key: &str) -> String {
    record.get(key).map(LogValue::to_text).unwrap_or_default()
}

fn present<'a>(record: &'a LogValue, key: &str) -> Option<&'a LogValue> {
    record.get(key).filter(|v| !v.is_blank())
}

/// The "started" group, one entry per line.
pub fn started_lines(record: &LogValue) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Started {} \"{}\" at {}",
            field(record, "request_method"),
            field(record, "path"),
            field(record, "start_time"),
        ),
        format!("Processing by {}", field(record, "processed")),
        format!("  Parameters: {}", parameters_text(record)),
    ];
    if let Some(headers) = present(record, "headers") {
        lines.push(format!("  Headers: {}", headers.to_text()));
    }
    lines.push(format!("  Remote IP: {}", field(record, "remote_ip")));
    if let Some(trace_id) = present(record, "trace_id") {
        lines.push(format!("  Trace ID: {}", trace_id.to_text()));
    }
    lines
}

/// The "completed" group, one entry per line.
pub fn completed_lines(record: &LogValue) -> Vec<String> {
    let runtime = match record.get("runtime") {
        Some(v) => v.to_text(),
        None => "0".to_string(),
    };
    let mut lines = vec![format!(
        "Completed {} in {}ms",
        field(record, "status"),
        runtime
    )];
    if let Some(exception) = present(record, "exception") {
        lines.push(format!("  Exception: {}", exception.to_text()));
    }
    if let Some(message) = present(record, "message") {
        lines.push(format!("  Message: {}", message.to_text()));
    }
    lines
}

/// The corrected "completed" group written after a HEAD body is stripped.
/// Led by a header naming the request so it reads apart from the first group.
pub fn rewritten_lines(record: &LogValue) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Rewritten {} \"{}\" after body strip",
            field(record, "request_method"),
            field(record, "path"),
        ),
        format!("Processed by {}", field(record, "processed")),
    ];
    lines.extend(completed_lines(record));
    lines
}

/// The whole record as one compact JSON object.
pub fn json_line(record: &LogValue) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

fn parameters_text(record: &LogValue) -> String {
    match record.get("parameters") {
        Some(p) if !p.is_null() => p.to_text(),
        _ => "{}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> LogValue {
        let mut v: LogValue = json!({
            "request_method": "GET",
            "path": "/widgets/7",
            "processed": "WidgetsAPI/widgets/:id",
            "parameters": {"id": "7"},
            "remote_ip": "10.0.0.1",
            "render_json": false
        })
        .into();
        if let LogValue::Map(m) = &mut v {
            m.insert(
                "start_time".into(),
                LogValue::Timestamp(Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap()),
            );
        }
        v
    }

    fn with(mut record: LogValue, key: &str, value: LogValue) -> LogValue {
        if let LogValue::Map(m) = &mut record {
            m.insert(key.into(), value);
        }
        record
    }

    #[test]
    fn started_group_without_optional_fields() {
        assert_eq!(
            started_lines(&sample()),
            vec![
                "Started GET \"/widgets/7\" at 2026-10-14 09:30:00 +0000",
                "Processing by WidgetsAPI/widgets/:id",
                "  Parameters: {\"id\":\"7\"}",
                "  Remote IP: 10.0.0.1",
            ]
        );
    }

    #[test]
    fn started_group_includes_headers_and_trace_id_when_present() {
        let record = with(sample(), "headers", json!({"Accept": "*/*"}).into());
        let record = with(record, "trace_id", LogValue::from("abc-123"));
        let lines = started_lines(&record);
        assert_eq!(lines[3], "  Headers: {\"Accept\":\"*/*\"}");
        assert_eq!(lines[5], "  Trace ID: abc-123");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn empty_headers_are_not_printed() {
        let record = with(sample(), "headers", LogValue::map());
        assert!(!started_lines(&record).iter().any(|l| l.contains("Headers")));
    }

    #[test]
    fn missing_parameters_render_as_empty_map() {
        let record: LogValue = json!({"request_method": "GET"}).into();
        assert!(started_lines(&record).contains(&"  Parameters: {}".to_string()));
    }

    #[test]
    fn completed_group_with_status_and_runtime() {
        let record = with(sample(), "status", LogValue::Int(200));
        let record = with(record, "runtime", LogValue::Float(12.5));
        assert_eq!(completed_lines(&record), vec!["Completed 200 in 12.5ms"]);
    }

    #[test]
    fn completed_group_reports_exception_and_message() {
        let record = with(sample(), "status", LogValue::Int(500));
        let record = with(record, "runtime", LogValue::Float(3.0));
        let record = with(record, "exception", LogValue::from("ParseError: bad"));
        let record = with(record, "message", LogValue::from("oops"));
        assert_eq!(
            completed_lines(&record),
            vec![
                "Completed 500 in 3.0ms",
                "  Exception: ParseError: bad",
                "  Message: oops",
            ]
        );
    }

    #[test]
    fn rewritten_group_is_headed_by_the_request() {
        let record = with(sample(), "request_method", LogValue::from("HEAD"));
        let record = with(record, "status", LogValue::Int(410));
        let record = with(record, "runtime", LogValue::Float(0.5));
        let record = with(record, "exception", LogValue::from("Gone"));
        assert_eq!(
            rewritten_lines(&record),
            vec![
                "Rewritten HEAD \"/widgets/7\" after body strip",
                "Processed by WidgetsAPI/widgets/:id",
                "Completed 410 in 0.5ms",
                "  Exception: Gone",
            ]
        );
    }

    #[test]
    fn json_line_is_single_line_object() {
        let line = json_line(&sample()).unwrap();
        assert!(!line.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["path"], "/widgets/7");
        assert_eq!(parsed["parameters"]["id"], "7");
    }
}
