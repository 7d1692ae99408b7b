use crate::app::{App, Halt, Response};
use crate::emit::emit_rewritten;
use crate::env::RequestEnv;
use crate::recorder::LogPhase;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use serde_json::{Map, Value};

/// Strips the body of HEAD responses and corrects the already-emitted log
/// record to match what the client actually receives.
///
/// Must wrap the stack containing the [`RequestLogger`](crate::RequestLogger).
/// Before stripping, the JSON body is read for structured error fields:
/// `code` becomes the record's exception and `error` its message; empty
/// values are ignored. The corrected completed group is emitted once more,
/// under a `Rewritten` header in text mode, and the handoff is put back
/// marked [`LogPhase::Published`], so a second override leaves it alone.
pub struct HeadOverride<A> {
    app: A,
}

impl<A: App> HeadOverride<A> {
    pub fn new(app: A) -> Self {
        Self { app }
    }

    fn rewrite(env: &mut RequestEnv, response: &Response) {
        let Some(mut handoff) = env.take_log() else {
            tracing::debug!(path = %env.path, "HEAD response without a published log record");
            return;
        };
        if handoff.phase == LogPhase::Published {
            env.publish_log(handoff);
            return;
        }

        let body = body_fields(&response.body);
        let record = &mut handoff.record;
        record.status = Some(response.status);
        if let Some(code) = body.get("code").and_then(text_of) {
            record.exception = Some(code);
        }
        if let Some(error) = body.get("error").and_then(text_of) {
            record.message = Some(error);
        }
        record.finish();

        emit_rewritten(handoff.sink.as_ref(), handoff.sanitizer.as_ref(), &handoff.record);

        handoff.phase = LogPhase::Published;
        env.publish_log(handoff);
    }
}

#[async_trait]
impl<A: App> App for HeadOverride<A> {
    async fn call(&self, env: &mut RequestEnv) -> Result<Response, Halt> {
        let mut response = self.app.call(env).await?;
        if env.method != Method::HEAD {
            return Ok(response);
        }

        Self::rewrite(env, &response);
        response.body = Bytes::new();
        Ok(response)
    }
}

/// Top-level fields of a JSON object body; anything else is treated as empty.
fn body_fields(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
