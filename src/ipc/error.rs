use serde_json::json;

use crate::error::GradebookError;
use crate::notify::Notice;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn no_session(id: &str) -> serde_json::Value {
    err(id, "no_session", "open a session first", None)
}

/// Domain failure envelope. A notice, when given, rides along in `details.notice`.
pub fn domain_err(id: &str, e: &GradebookError, notice: Option<Notice>) -> serde_json::Value {
    let mut details = e.details().unwrap_or_else(|| json!({}));
    if let Some(n) = notice {
        details["notice"] = json!(n);
    }
    let details = match details.as_object() {
        Some(obj) if obj.is_empty() => None,
        _ => Some(details),
    };
    err(id, e.code(), e.to_string(), details)
}
