use crate::grade::{derive, parse_mark};
use crate::ipc::error::{domain_err, err, no_session, ok};
use crate::ipc::helpers::{mark_text, str_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_catalog_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    let catalog = &session.catalog;
    ok(
        &req.id,
        json!({
            "classes": catalog.classes(),
            "subjects": catalog.subjects(),
            "terms": catalog.terms(),
        }),
    )
}

fn handle_roster_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    let Some(class) = str_param(req, "class") else {
        return err(&req.id, "bad_params", "missing class", None);
    };
    match session.catalog.roster(class) {
        Ok(roster) => ok(&req.id, json!({ "class": class, "students": roster })),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

/// Grade preview for a mark typed into the UI; needs no session.
fn handle_grades_derive(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = mark_text(req.params.get("mark")) else {
        return err(&req.id, "bad_params", "missing mark", None);
    };
    match parse_mark(&raw) {
        Ok(mark) => {
            let (grade, status) = derive(mark);
            ok(
                &req.id,
                json!({ "mark": mark, "grade": grade, "status": status }),
            )
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.get" => Some(handle_catalog_get(state, req)),
        "roster.get" => Some(handle_roster_get(state, req)),
        "grades.derive" => Some(handle_grades_derive(state, req)),
        _ => None,
    }
}
