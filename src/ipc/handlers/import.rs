use crate::error::GradebookError;
use crate::export::roster_template_csv;
use crate::import::UploadSource;
use crate::intake::FileDescriptor;
use crate::ipc::error::{domain_err, err, no_session, ok};
use crate::ipc::helpers::{mark_text, str_param};
use crate::ipc::types::{AppState, Request};
use crate::notify::Notice;
use crate::validate::RawMark;
use serde_json::json;
use std::path::PathBuf;

fn parse_rows(raw: &serde_json::Value) -> Result<Vec<RawMark>, String> {
    let Some(items) = raw.as_array() else {
        return Err("rows must be an array".to_string());
    };
    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(student_id) = item.get("studentId").and_then(|v| v.as_str()) else {
            return Err(format!("rows[{i}].studentId must be a string"));
        };
        let mark = item.get("markText").or_else(|| item.get("mark"));
        let Some(mark_text) = mark_text(mark).or_else(|| mark.is_none().then(String::new)) else {
            return Err(format!("rows[{i}].mark must be a string, number or null"));
        };
        rows.push(RawMark::new(student_id, mark_text));
    }
    Ok(rows)
}

fn handle_import_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let term = str_param(req, "term");
    let class = str_param(req, "class");
    let subject = str_param(req, "subject");

    match session
        .import
        .select(&session.catalog, term, class, subject)
    {
        Ok(reset) => {
            if reset {
                tracing::info!(
                    class = %session.import.selection().class,
                    "class changed; import state reset"
                );
            }
            ok(
                &req.id,
                json!({
                    "selection": session.import.selection(),
                    "canUpload": session.import.selection().is_complete(),
                    "reset": reset,
                }),
            )
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_import_attach(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let Some(file_name) = str_param(req, "fileName") else {
        return err(&req.id, "bad_params", "missing fileName", None);
    };
    let file = FileDescriptor {
        file_name: file_name.to_string(),
        mime_type: str_param(req, "mimeType").map(|s| s.to_string()),
    };

    let source = match (str_param(req, "path"), req.params.get("rows")) {
        (Some(path), None) => UploadSource::Path(PathBuf::from(path)),
        (None, Some(rows)) => match parse_rows(rows) {
            Ok(rows) => UploadSource::Rows(rows),
            Err(message) => return err(&req.id, "bad_params", message, None),
        },
        (Some(_), Some(_)) => {
            return err(&req.id, "bad_params", "pass either path or rows, not both", None)
        }
        (None, None) => return err(&req.id, "bad_params", "missing path or rows", None),
    };

    match session.import.attach(file, source) {
        Ok(attached) => {
            tracing::info!(
                file = %attached.file_name,
                rows = attached.row_count,
                "mark sheet accepted"
            );
            let notice = Notice::FileAccepted {
                file_name: attached.file_name.clone(),
                row_count: attached.row_count,
            };
            ok(&req.id, json!({ "file": attached, "notices": [notice] }))
        }
        Err(e) => {
            tracing::info!(file = %file_name, code = e.code(), "mark sheet rejected");
            let notice = match &e {
                GradebookError::InvalidFileType { file_name, .. } => {
                    Some(Notice::InvalidFileType {
                        file_name: file_name.clone(),
                        message: e.to_string(),
                    })
                }
                _ => None,
            };
            domain_err(&req.id, &e, notice)
        }
    }
}

fn handle_import_poll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let was_processing = session.import.status().phase == "processing";

    match session.import.poll(&session.catalog) {
        Ok(outcome) => {
            let mut notices = Vec::new();
            if outcome.done && was_processing {
                if let Some(report) = outcome.report {
                    notices.push(Notice::ImportValidated {
                        counts: report.counts.clone(),
                    });
                }
            }
            let mut result = json!(outcome);
            result["notices"] = json!(notices);
            ok(&req.id, result)
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_import_remove_file(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    let removed = session.import.remove_file();
    if removed {
        tracing::info!("attached mark sheet removed");
    }
    ok(&req.id, json!({ "removed": removed }))
}

fn handle_import_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    ok(&req.id, json!(session.import.status()))
}

fn handle_import_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return no_session(&req.id);
    };
    match session.import.commit(&mut session.overview) {
        Ok(batch) => {
            let notice = Notice::ImportCommitted {
                batch_id: batch.batch_id.clone(),
                committed: batch.summaries.len(),
                excluded: batch.excluded,
            };
            ok(&req.id, json!({ "batch": batch, "notices": [notice] }))
        }
        Err(e) => domain_err(&req.id, &e, None),
    }
}

fn handle_import_template(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    let class = str_param(req, "class")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(session.import.selection().class.as_str());
    if class.is_empty() {
        return err(&req.id, "bad_params", "missing class", None);
    }
    let roster = match session.catalog.roster(class) {
        Ok(r) => r,
        Err(e) => return domain_err(&req.id, &e, None),
    };
    match roster_template_csv(roster) {
        Ok(csv) => ok(
            &req.id,
            json!({
                "fileName": format!("{}-marks.csv", class.replace(' ', "_")),
                "csv": csv,
                "rowCount": roster.len(),
            }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:?}"), None),
    }
}

fn handle_import_batches(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    ok(&req.id, json!({ "batches": session.import.batches() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.select" => Some(handle_import_select(state, req)),
        "import.attach" => Some(handle_import_attach(state, req)),
        "import.poll" => Some(handle_import_poll(state, req)),
        "import.removeFile" => Some(handle_import_remove_file(state, req)),
        "import.status" => Some(handle_import_status(state, req)),
        "import.commit" => Some(handle_import_commit(state, req)),
        "import.template" => Some(handle_import_template(state, req)),
        "import.batches" => Some(handle_import_batches(state, req)),
        _ => None,
    }
}
