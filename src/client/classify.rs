//! Maps raw upstream responses onto payloads or typed failures

use reqwest::StatusCode;
use serde_json::Value;

use super::transport::RawResponse;
use crate::error::FetchError;

/// Turns a transported response into a payload or a `FetchError`
///
/// NewsAPI reports failures as `{"status": "error", "code", "message"}`, often
/// with a 4xx status, so the body is inspected even for non-2xx responses. A
/// non-2xx response whose body is not such an error object is a transport
/// failure. Only a 2xx body with `status: "ok"` is a success.
pub fn classify(response: RawResponse) -> Result<Value, FetchError> {
    let success = (200..300).contains(&response.status);

    let body: Value = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(e) if success => return Err(FetchError::Decode(e.to_string())),
        Err(_) => return Err(http_failure(response.status)),
    };

    match body.get("status").and_then(Value::as_str) {
        Some("ok") if success => Ok(body),
        Some("error") => Err(upstream_error(&body)),
        _ if !success => Err(http_failure(response.status)),
        _ => Err(upstream_error(&body)),
    }
}

fn upstream_error(body: &Value) -> FetchError {
    let field = |name: &str, default: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    FetchError::Upstream {
        code: field("code", "unknown"),
        message: field("message", "Unknown error"),
    }
}

fn http_failure(status: u16) -> FetchError {
    let status = StatusCode::from_u16(status)
        .map(|s| s.to_string())
        .unwrap_or_else(|_| status.to_string());
    FetchError::Transport(format!("HTTP {}", status))
}
