use crate::error::GradebookError;
use crate::export::records_csv;
use crate::ipc::error::{domain_err, err, no_session, ok};
use crate::ipc::helpers::{mark_text, positive_usize, required_id};
use crate::ipc::types::{AppState, Request};
use crate::notify::Notice;
use crate::stats::mark_stats;
use crate::store::{OverviewFilters, OverviewStore, RowState};
use serde_json::json;

/// Filters given in the request win; otherwise the view's current filters apply.
fn effective_filters(
    store: &OverviewStore,
    req: &Request,
) -> Result<OverviewFilters, serde_json::Value> {
    match req.params.get("filters") {
        None => Ok(store.filters().clone()),
        Some(raw) => OverviewFilters::from_params(Some(raw))
            .map_err(|message| err(&req.id, "bad_params", message, None)),
    }
}

fn handle_overview_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let store = &mut session.overview;

    let page_size = match positive_usize(req, "pageSize") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page = match positive_usize(req, "page") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut filters_changed = false;
    if req.params.get("filters").is_some() {
        let filters = match effective_filters(store, req) {
            Ok(f) => f,
            Err(resp) => return resp,
        };
        filters_changed = store.set_filters(filters);
    }
    if let Some(n) = page_size {
        store.set_page_size(n);
    }
    // A filter change always lands on page 1, whatever page was asked for.
    if let Some(p) = page {
        if !filters_changed {
            store.set_page(p);
        }
    }

    let view = store.current_view();
    ok(
        &req.id,
        json!({
            "records": view.items,
            "page": view.page,
            "pageSize": view.page_size,
            "totalItems": view.total_items,
            "totalPages": view.total_pages,
            "filtersChanged": filters_changed,
            "editingId": store.editing_id(),
        }),
    )
}

fn handle_overview_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    let id = match required_id(req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match session.overview.get(id) {
        Some(record) => {
            let draft = match session.overview.state_of(id) {
                Some(RowState::Editing { draft }) => Some(draft.as_str()),
                _ => None,
            };
            ok(
                &req.id,
                json!({
                    "record": record,
                    "editing": draft.is_some(),
                    "draft": draft,
                }),
            )
        }
        None => domain_err(&req.id, &GradebookError::RecordNotFound(id), None),
    }
}

fn handle_overview_begin_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let id = match required_id(req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let previous = session.overview.editing_id().filter(|p| *p != id);
    match session.overview.begin_edit(id) {
        Ok(record) => ok(
            &req.id,
            json!({ "record": record, "closedEditId": previous }),
        ),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_overview_commit_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let id = match required_id(req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(raw) = mark_text(req.params.get("mark")) else {
        return err(&req.id, "bad_params", "missing mark", None);
    };

    match session.overview.commit_edit(id, &raw) {
        Ok(record) => {
            tracing::info!(id, mark = record.mark, grade = %record.grade, "grade updated");
            let notice = Notice::GradeUpdated {
                id,
                mark: record.mark,
                grade: record.grade,
                status: record.status,
            };
            ok(&req.id, json!({ "record": record, "notices": [notice] }))
        }
        Err(e) => {
            let notice = match &e {
                GradebookError::InvalidMark { .. } => Some(Notice::InvalidMark {
                    id,
                    message: e.to_string(),
                }),
                _ => None,
            };
            domain_err(&req.id, &e, notice)
        }
    }
}

fn handle_overview_cancel_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let id = match required_id(req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match session.overview.cancel_edit(id) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_overview_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let id = match required_id(req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    // The UI's confirm dialog must have run; the store itself never asks.
    let confirmed = req
        .params
        .get("confirmed")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !confirmed {
        return err(
            &req.id,
            "confirmation_required",
            "delete must be confirmed by the user",
            Some(json!({ "id": id })),
        );
    }

    match session.overview.delete(id) {
        Ok(record) => {
            tracing::info!(id, student = %record.student_name, "grade record deleted");
            let notice = Notice::RecordDeleted {
                id,
                student_name: record.student_name.clone(),
            };
            ok(
                &req.id,
                json!({
                    "deletedId": id,
                    "remaining": session.overview.len(),
                    "notices": [notice],
                }),
            )
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_overview_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    let filters = match effective_filters(&session.overview, req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let stats = mark_stats(session.overview.filter(&filters).iter().map(|r| r.mark));
    ok(&req.id, json!({ "stats": stats }))
}

fn handle_overview_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    let filters = match effective_filters(&session.overview, req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let records = session.overview.filter(&filters);
    match records_csv(records.iter().copied()) {
        Ok(csv) => ok(&req.id, json!({ "csv": csv, "rowCount": records.len() })),
        Err(e) => err(&req.id, "export_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "overview.query" => Some(handle_overview_query(state, req)),
        "overview.get" => Some(handle_overview_get(state, req)),
        "overview.beginEdit" => Some(handle_overview_begin_edit(state, req)),
        "overview.commitEdit" => Some(handle_overview_commit_edit(state, req)),
        "overview.cancelEdit" => Some(handle_overview_cancel_edit(state, req)),
        "overview.delete" => Some(handle_overview_delete(state, req)),
        "overview.stats" => Some(handle_overview_stats(state, req)),
        "overview.exportCsv" => Some(handle_overview_export_csv(state, req)),
        _ => None,
    }
}
