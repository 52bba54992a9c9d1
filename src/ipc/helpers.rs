use serde_json::Value;

use crate::ipc::error::err;
use crate::ipc::types::Request;

pub fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn required_id(req: &Request) -> Result<u64, Value> {
    req.params
        .get("id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| err(&req.id, "bad_params", "missing id", None))
}

/// Marks arrive as strings from text inputs and as numbers from spreadsheets
/// and scripts; both become the raw text the validators expect.
pub fn mark_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn positive_usize(req: &Request, key: &str) -> Result<Option<usize>, Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 => Ok(Some(n as usize)),
            _ => Err(err(
                &req.id,
                "bad_params",
                format!("{key} must be a positive integer"),
                Some(serde_json::json!({ key: v })),
            )),
        },
    }
}
