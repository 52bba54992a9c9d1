use crate::ipc::error::{err, ok};
use crate::ipc::helpers::positive_usize;
use crate::ipc::types::{AppState, Request};
use crate::session::{Session, SessionOptions};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionOpen": state.session.is_some(),
            "openedAt": state.session.as_ref().map(|s| s.opened_at.clone())
        }),
    )
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let seed_demo = match req.params.get("seedDemo") {
        None => state.config.seed_demo,
        Some(v) if v.is_null() => state.config.seed_demo,
        Some(v) => match v.as_bool() {
            Some(b) => b,
            None => return err(&req.id, "bad_params", "seedDemo must be a boolean", None),
        },
    };
    let seed = match req.params.get("seed") {
        None => state.config.seed,
        Some(v) if v.is_null() => state.config.seed,
        Some(v) => match v.as_u64() {
            Some(n) => n,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "seed must be an unsigned integer",
                    None,
                )
            }
        },
    };
    let page_size = match positive_usize(req, "pageSize") {
        Ok(v) => v.unwrap_or(state.config.page_size),
        Err(resp) => return resp,
    };

    if state.session.is_some() {
        tracing::info!("replacing open session");
    }
    let session = Session::open(SessionOptions {
        seed_demo,
        seed,
        page_size,
    });
    let result = json!({
        "openedAt": session.opened_at,
        "recordCount": session.overview.len(),
        "pageSize": session.overview.page_size(),
    });
    state.session = Some(session);
    ok(&req.id, result)
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let closed = state.session.take().is_some();
    if closed {
        tracing::info!("session closed");
    }
    ok(&req.id, json!({ "closed": closed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        _ => None,
    }
}
