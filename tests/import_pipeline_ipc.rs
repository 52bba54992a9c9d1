use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .env("GRADEBOOKD_LOG_LEVEL", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected failure: {}",
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
}

fn poll_until_done(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    prefix: &str,
) -> serde_json::Value {
    let mut progress = Vec::new();
    for i in 0..4 {
        let r = request_ok(stdin, reader, &format!("{prefix}-{i}"), "import.poll", json!({}));
        progress.push(r.get("progress").and_then(|v| v.as_u64()).expect("progress"));
        if r.get("done").and_then(|v| v.as_bool()) == Some(true) {
            assert_eq!(progress, vec![25, 50, 75, 100]);
            return r;
        }
    }
    panic!("import never finished: {:?}", progress);
}

#[test]
fn partial_upload_commits_only_valid_marks() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({ "seedDemo": false }));
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "import.select",
        json!({ "term": "Term 1", "class": "Grade 11A", "subject": "Science" }),
    );
    assert_eq!(selected.get("canUpload").and_then(|v| v.as_bool()), Some(true));

    let attached = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "import.attach",
        json!({
            "fileName": "science.csv",
            "mimeType": "text/csv",
            "rows": [
                { "studentId": "STU-11A-001", "markText": "72" },
                { "studentId": "STU-11A-003", "mark": 40 },
                { "studentId": "STU-11A-004", "mark": "150" },
                { "studentId": "STU-99Z-001", "mark": "88" }
            ]
        }),
    );
    assert_eq!(
        attached.get("notices").and_then(|n| n[0].get("kind")).and_then(|v| v.as_str()),
        Some("fileAccepted")
    );

    let done = poll_until_done(&mut stdin, &mut reader, "4");
    let rows = done
        .get("report")
        .and_then(|r| r.get("rows"))
        .and_then(|v| v.as_array())
        .cloned()
        .expect("rows");
    // 8 roster members plus one unmatched upload row.
    assert_eq!(rows.len(), 9);
    let status = |i: usize| rows[i].get("status").and_then(|v| v.as_str()).unwrap_or("");
    assert_eq!(status(0), "valid");
    assert_eq!(status(1), "missing");
    assert_eq!(rows[1].get("mark"), Some(&serde_json::Value::Null));
    assert_eq!(status(2), "valid");
    assert_eq!(status(3), "invalid");
    assert_eq!(rows[3].get("mark").and_then(|v| v.as_f64()), Some(150.0));
    assert_eq!(
        rows[3].get("errorMessage").and_then(|v| v.as_str()),
        Some("mark out of range")
    );
    assert_eq!(rows[8].get("studentId").and_then(|v| v.as_str()), Some("STU-99Z-001"));
    assert_eq!(
        rows[8].get("errorMessage").and_then(|v| v.as_str()),
        Some("student not found")
    );
    let counts = done.get("report").and_then(|r| r.get("counts")).cloned().expect("counts");
    assert_eq!(counts, json!({ "valid": 2, "missing": 5, "invalid": 1, "unmatched": 1 }));
    assert_eq!(
        done.get("notices").and_then(|n| n[0].get("kind")).and_then(|v| v.as_str()),
        Some("importValidated")
    );

    let committed = request_ok(&mut stdin, &mut reader, "5", "import.commit", json!({}));
    let summaries = committed
        .get("batch")
        .and_then(|b| b.get("summaries"))
        .cloned()
        .expect("summaries");
    assert_eq!(
        summaries,
        json!([
            {
                "studentId": "STU-11A-001",
                "studentName": "Wen Zhao",
                "mark": 72,
                "grade": "B",
                "status": "Pass"
            },
            {
                "studentId": "STU-11A-003",
                "studentName": "Yara Haddad",
                "mark": 40,
                "grade": "F",
                "status": "Fail"
            }
        ])
    );
    assert_eq!(
        committed.get("batch").and_then(|b| b.get("excluded")).and_then(|v| v.as_u64()),
        Some(7)
    );

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "overview.query",
        json!({ "filters": { "class": "Grade 11A", "subject": "Science", "term": "Term 1" } }),
    );
    assert_eq!(view.get("totalItems").and_then(|v| v.as_u64()), Some(2));
    let names: Vec<&str> = view
        .get("records")
        .and_then(|v| v.as_array())
        .expect("records")
        .iter()
        .filter_map(|r| r.get("studentName").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, vec!["Wen Zhao", "Yara Haddad"]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn recommitting_appends_and_flags_earlier_batch() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({ "seedDemo": false }));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "import.select",
        json!({ "term": "Term 2", "class": "Grade 10B", "subject": "History" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "import.attach",
        json!({ "fileName": "h.xlsx", "rows": [{ "studentId": "STU-10B-002", "mark": 81 }] }),
    );
    let _ = poll_until_done(&mut stdin, &mut reader, "4");

    let first = request_ok(&mut stdin, &mut reader, "5", "import.commit", json!({}));
    let second = request_ok(&mut stdin, &mut reader, "6", "import.commit", json!({}));
    let first_id = first["batch"]["batchId"].as_str().expect("batch id").to_string();
    assert_ne!(second["batch"]["batchId"].as_str(), Some(first_id.as_str()));
    assert_eq!(second["batch"]["supersedesBatchIds"], json!([first_id]));

    let batches = request_ok(&mut stdin, &mut reader, "7", "import.batches", json!({}));
    assert_eq!(batches["batches"].as_array().map(|a| a.len()), Some(2));

    let view = request_ok(&mut stdin, &mut reader, "8", "overview.query", json!({ "filters": {} }));
    assert_eq!(view["totalItems"], json!(2));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn gate_and_reset_rules_hold_over_ipc() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let early = request(&mut stdin, &mut reader, "0", "import.status", json!({}));
    assert_eq!(error_code(&early), "no_session");

    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({ "seedDemo": false }));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "import.select",
        json!({ "term": "Term 1", "class": "Grade 10A" }),
    );
    let blocked = request(
        &mut stdin,
        &mut reader,
        "3",
        "import.attach",
        json!({ "fileName": "m.csv", "rows": [] }),
    );
    assert_eq!(error_code(&blocked), "selection_incomplete");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "import.select",
        json!({ "subject": "English" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "import.attach",
        json!({ "fileName": "m.csv", "rows": [{ "studentId": "STU-10A-001", "mark": 90 }] }),
    );

    let rejected = request(
        &mut stdin,
        &mut reader,
        "6",
        "import.attach",
        json!({ "fileName": "essay.docx", "mimeType": "application/msword", "rows": [] }),
    );
    assert_eq!(error_code(&rejected), "invalid_file_type");
    assert_eq!(
        rejected["error"]["details"]["notice"]["kind"],
        json!("invalidFileType")
    );
    let status = request_ok(&mut stdin, &mut reader, "7", "import.status", json!({}));
    assert_eq!(status["file"]["fileName"], json!("m.csv"));
    assert_eq!(status["phase"], json!("processing"));

    let reset = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "import.select",
        json!({ "class": "Grade 10B" }),
    );
    assert_eq!(reset["reset"], json!(true));
    let status = request_ok(&mut stdin, &mut reader, "9", "import.status", json!({}));
    assert_eq!(status["phase"], json!("idle"));
    assert!(status.get("file").is_none());

    let poll = request(&mut stdin, &mut reader, "10", "import.poll", json!({}));
    assert_eq!(error_code(&poll), "no_file");

    let unknown = request(
        &mut stdin,
        &mut reader,
        "11",
        "import.select",
        json!({ "class": "Grade 12Z" }),
    );
    assert_eq!(error_code(&unknown), "unknown_class");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn removing_file_mid_processing_cancels() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({ "seedDemo": false }));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "import.select",
        json!({ "term": "Term 1", "class": "Grade 10A", "subject": "English" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "import.attach",
        json!({ "fileName": "m.csv", "rows": [{ "studentId": "STU-10A-001", "mark": 90 }] }),
    );
    let half = request_ok(&mut stdin, &mut reader, "4", "import.poll", json!({}));
    assert_eq!(half["progress"], json!(25));
    assert!(half.get("report").is_none());

    let removed = request_ok(&mut stdin, &mut reader, "5", "import.removeFile", json!({}));
    assert_eq!(removed["removed"], json!(true));
    let commit = request(&mut stdin, &mut reader, "6", "import.commit", json!({}));
    assert_eq!(error_code(&commit), "no_file");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn commit_after_blanking_a_selector_is_refused() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.open",
        json!({ "seedDemo": false }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "import.select",
        json!({ "term": "Term 1", "class": "Grade 10A", "subject": "Mathematics" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "import.attach",
        json!({ "fileName": "m.csv", "rows": [{ "studentId": "STU-10A-001", "mark": 70 }] }),
    );
    let _ = poll_until_done(&mut stdin, &mut reader, "4");

    let blanked = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "import.select",
        json!({ "term": "", "subject": "" }),
    );
    assert_eq!(blanked["canUpload"], json!(false));

    let refused = request(&mut stdin, &mut reader, "6", "import.commit", json!({}));
    assert_eq!(error_code(&refused), "selection_incomplete");
    let view = request_ok(&mut stdin, &mut reader, "7", "overview.query", json!({}));
    assert_eq!(view["totalItems"], json!(0));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "import.select",
        json!({ "term": "Term 1", "subject": "Mathematics" }),
    );
    let committed = request_ok(&mut stdin, &mut reader, "9", "import.commit", json!({}));
    assert_eq!(committed["batch"]["term"], json!("Term 1"));
    assert_eq!(committed["batch"]["subject"], json!("Mathematics"));

    drop(stdin);
    let _ = child.wait();
}
