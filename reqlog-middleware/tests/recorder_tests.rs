use async_trait::async_trait;
use http::Method;
use reqlog_core::{HeaderCapture, LogValue};
use reqlog_middleware::{
    App, Defaults, ErrorSignal, Exception, Halt, KeyFilter, LogPhase, Options, RequestEnv,
    RequestLogger, Response, RouteInfo,
};
use reqlog_observability::MemorySink;
use serde_json::{json, Value};
use std::sync::Arc;

enum Stub {
    Respond(u16),
    Raise(&'static str, &'static str),
    Signal(u16, Option<&'static str>),
}

#[async_trait]
impl App for Stub {
    async fn call(&self, _env: &mut RequestEnv) -> Result<Response, Halt> {
        match self {
            Stub::Respond(status) => Ok(Response::json(*status, &json!({"ok": true}))),
            Stub::Raise(kind, message) => Err(Exception::new(*kind, *message).into()),
            Stub::Signal(status, message) => {
                let mut signal = ErrorSignal::new(*status);
                if let Some(m) = message {
                    signal = signal.with_message(*m);
                }
                Err(signal.into())
            }
        }
    }
}

fn logger(app: Stub, sink: &Arc<MemorySink>, options: Options) -> RequestLogger<Stub> {
    let defaults = Defaults {
        sink: sink.clone(),
        ..Defaults::default()
    };
    RequestLogger::new(app, &defaults, options)
}

fn widget_env() -> RequestEnv {
    RequestEnv::new(Method::GET, "/widgets/7")
        .with_param("id", "7")
        .with_remote_addr("10.0.0.1")
        .with_route(RouteInfo::new(
            "/",
            vec!["widgets".into(), "/:id".into()],
            "WidgetsAPI",
        ))
}

fn parse(line: &str) -> Value {
    serde_json::from_str(line).unwrap()
}

// =============================================================================
// Text mode
// =============================================================================

#[tokio::test]
async fn test_text_mode_started_and_completed_groups() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(200), &sink, Options::new());
    let mut env = widget_env();

    let response = app.call(&mut env).await.unwrap();
    assert_eq!(response.status, 200);

    let lines = sink.lines();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Started GET \"/widgets/7\" at "));
    assert_eq!(lines[1], "Processing by WidgetsAPI/widgets/:id");
    assert_eq!(lines[2], "  Parameters: {\"id\":\"7\"}");
    assert_eq!(lines[3], "  Remote IP: 10.0.0.1");
    assert!(lines[4].starts_with("Completed 200 in "));
    assert!(lines[4].ends_with("ms"));
}

#[tokio::test]
async fn test_trace_id_is_logged_when_present() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(200), &sink, Options::new());
    let mut env = widget_env().with_trace_id("trace-9");

    app.call(&mut env).await.unwrap();
    assert!(sink.lines().contains(&"  Trace ID: trace-9".to_string()));
}

#[tokio::test]
async fn test_missing_route_logs_empty_processed() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(204), &sink, Options::new());
    let mut env = RequestEnv::new(Method::GET, "/health");

    app.call(&mut env).await.unwrap();
    assert_eq!(sink.lines()[1], "Processing by ");
}

// =============================================================================
// JSON mode
// =============================================================================

#[tokio::test]
async fn test_json_mode_emits_one_object_per_group() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(201), &sink, Options::new().render_json(true));
    let mut env = widget_env();

    app.call(&mut env).await.unwrap();

    let lines = sink.lines();
    assert_eq!(lines.len(), 2);
    let started = parse(&lines[0]);
    let completed = parse(&lines[1]);

    assert_eq!(started["render_json"], true);
    assert_eq!(started["path"], "/widgets/7");
    assert!(started.get("status").is_none());
    assert!(started.get("runtime").is_none());

    assert_eq!(completed["status"], 201);
    assert!(completed["runtime"].as_f64().unwrap() >= 0.0);
    assert_eq!(completed["processed"], "WidgetsAPI/widgets/:id");
}

#[tokio::test]
async fn test_start_time_is_captured_once() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(200), &sink, Options::new().render_json(true));
    let mut env = widget_env();

    app.call(&mut env).await.unwrap();

    let lines = sink.lines();
    let started = parse(&lines[0]);
    let completed = parse(&lines[1]);
    assert_eq!(started["start_time"], completed["start_time"]);

    let record = &env.published_log().unwrap().record;
    let start = record.started_at().unwrap();
    let end = record.end_time().unwrap();
    assert!(end >= start);
}

// =============================================================================
// Failure channels
// =============================================================================

#[tokio::test]
async fn test_exception_is_logged_and_reraised() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Raise("ValidationError", "name is missing"), &sink, Options::new());
    let mut env = widget_env();

    match app.call(&mut env).await {
        Err(Halt::Exception(e)) => {
            assert_eq!(e.kind(), "ValidationError");
            assert_eq!(e.message(), "name is missing");
        }
        other => panic!("expected exception, got {other:?}"),
    }

    let lines = sink.lines();
    assert!(lines.iter().any(|l| l.starts_with("Completed 500 in ")));
    assert!(lines.contains(&"  Exception: ValidationError: name is missing".to_string()));

    let handoff = env.published_log().unwrap();
    assert_eq!(handoff.phase, LogPhase::Excepted);
    assert_eq!(handoff.record.status, Some(500));
}

#[tokio::test]
async fn test_around_exception_transforms_before_logging() {
    let sink = Arc::new(MemorySink::new());
    let options = Options::new().around_exception(|e| {
        Exception::new("WrappedError", format!("wrapped {}", e.message()))
    });
    let app = logger(Stub::Raise("IoError", "disk"), &sink, options);
    let mut env = widget_env();

    match app.call(&mut env).await {
        Err(Halt::Exception(e)) => assert_eq!(e.to_string(), "WrappedError: wrapped disk"),
        other => panic!("expected exception, got {other:?}"),
    }
    let record = &env.published_log().unwrap().record;
    assert_eq!(record.exception.as_deref(), Some("WrappedError: wrapped disk"));
}

#[tokio::test]
async fn test_error_signal_is_logged_and_resignalled() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Signal(404, Some("not found")), &sink, Options::new());
    let mut env = widget_env();

    match app.call(&mut env).await {
        Err(Halt::Error(signal)) => {
            assert_eq!(signal.status, 404);
            assert_eq!(signal.message.as_deref(), Some("not found"));
        }
        other => panic!("expected error signal, got {other:?}"),
    }

    let lines = sink.lines();
    assert!(lines.iter().any(|l| l.starts_with("Completed 404 in ")));
    assert!(lines.contains(&"  Message: not found".to_string()));
    assert!(!lines.iter().any(|l| l.contains("Exception")));

    let handoff = env.published_log().unwrap();
    assert_eq!(handoff.phase, LogPhase::Failed);
    assert_eq!(handoff.record.message.as_deref(), Some("not found"));
}

#[tokio::test]
async fn test_error_signal_without_message() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Signal(401, None), &sink, Options::new().render_json(true));
    let mut env = widget_env();

    assert!(matches!(app.call(&mut env).await, Err(Halt::Error(_))));
    let completed = parse(&sink.lines()[1]);
    assert_eq!(completed["status"], 401);
    assert!(completed.get("message").is_none());
}

// =============================================================================
// Headers, filtering, redaction
// =============================================================================

#[tokio::test]
async fn test_header_capture_list_is_case_insensitive() {
    let sink = Arc::new(MemorySink::new());
    let options = Options::new()
        .render_json(true)
        .headers(HeaderCapture::List(vec!["content-type".into()]));
    let app = logger(Stub::Respond(200), &sink, options);
    let mut env = widget_env()
        .with_header("Content-Type", "application/json")
        .with_header("Authorization", "Bearer x");

    app.call(&mut env).await.unwrap();
    let started = parse(&sink.lines()[0]);
    assert_eq!(started["headers"], json!({"Content-Type": "application/json"}));
}

#[tokio::test]
async fn test_headers_absent_when_not_configured() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(200), &sink, Options::new().render_json(true));
    let mut env = widget_env().with_header("Accept", "*/*");

    app.call(&mut env).await.unwrap();
    assert!(parse(&sink.lines()[0]).get("headers").is_none());
}

#[tokio::test]
async fn test_nested_passwords_are_redacted() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(200), &sink, Options::new().render_json(true));
    let body = match LogValue::from(json!({
        "user": {"name": "ada", "password": "hunter2"},
        "password": "top"
    })) {
        LogValue::Map(m) => m,
        _ => unreachable!(),
    };
    let mut env = RequestEnv::new(Method::POST, "/login").with_body_params(body);

    app.call(&mut env).await.unwrap();
    let started = parse(&sink.lines()[0]);
    assert_eq!(
        started["parameters"],
        json!({"user": {"name": "ada", "password": "[REDACTED]"}, "password": "[REDACTED]"})
    );
    assert!(!sink.lines().iter().any(|l| l.contains("hunter2")));
}

#[tokio::test]
async fn test_filter_runs_before_sanitizer() {
    let sink = Arc::new(MemorySink::new());
    let options = Options::new()
        .render_json(true)
        .filter(Arc::new(KeyFilter::new(["token"])));
    let app = logger(Stub::Respond(200), &sink, options);
    let mut env = RequestEnv::new(Method::POST, "/session")
        .with_param("token", "abc")
        .with_param("password", "x")
        .with_param("name", "ada");

    app.call(&mut env).await.unwrap();
    let started = parse(&sink.lines()[0]);
    assert_eq!(
        started["parameters"],
        json!({"token": "[FILTERED]", "password": "[REDACTED]", "name": "ada"})
    );
}

#[tokio::test]
async fn test_custom_sanitizer_replaces_default() {
    let sink = Arc::new(MemorySink::new());
    let sanitizer = |key: Option<&str>, value: LogValue| match key {
        Some("id") => LogValue::from("***"),
        _ => value,
    };
    let options = Options::new()
        .render_json(true)
        .sanitizer(Arc::new(sanitizer));
    let app = logger(Stub::Respond(200), &sink, options);
    let mut env = widget_env().with_param("password", "kept");

    app.call(&mut env).await.unwrap();
    let started = parse(&sink.lines()[0]);
    assert_eq!(started["parameters"], json!({"id": "***", "password": "kept"}));
}

// =============================================================================
// Handoff
// =============================================================================

#[tokio::test]
async fn test_completed_record_is_published() {
    let sink = Arc::new(MemorySink::new());
    let app = logger(Stub::Respond(200), &sink, Options::new());
    let mut env = widget_env();

    app.call(&mut env).await.unwrap();
    let handoff = env.take_log().unwrap();
    assert_eq!(handoff.phase, LogPhase::Completed);
    assert_eq!(handoff.record.status, Some(200));
    assert!(handoff.record.runtime_ms().is_some());
    assert!(env.published_log().is_none());
}
