//! End-to-end tests for the bankrec binary

use std::io::Write;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use axum::http::{header, StatusCode};
use axum::routing::post;
use axum::Router;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn snapshot_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write snapshot");
    file
}

fn bankrec() -> Command {
    let mut cmd = Command::cargo_bin("bankrec").expect("binary not built");
    for var in ["BANKREC_SERVER", "BANKREC_SESSION", "BANKREC_CSRF_TOKEN"] {
        cmd.env_remove(var);
    }
    cmd
}

const MIXED: &str = r#"{
    "matches": [
        {"match_id": 1, "bank_ids": [10, 11], "gl_ids": [20]},
        {"match_id": 2, "bank_ids": [12], "gl_ids": []}
    ],
    "pairs": [
        {"match_id": 1, "bank_id": 13, "gl_id": 20},
        {"match_id": 3, "bank_id": 11, "gl_id": 21},
        {"match_id": 4, "bank_id": null, "gl_id": 22}
    ]
}"#;

#[test]
fn test_inspect_text() {
    let file = snapshot_file(MIXED);
    bankrec()
        .arg("inspect")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Groups:        3"))
        .stdout(predicate::str::contains("Bank: 10, 11, 13"))
        .stdout(predicate::str::contains("Consistency:   OK"))
        .stdout(predicate::str::contains("Skipped:       1 rows"));
}

#[test]
fn test_inspect_json() {
    let file = snapshot_file(MIXED);
    let output = bankrec()
        .args(["--format", "json", "inspect"])
        .arg(file.path())
        .output()
        .expect("failed to run");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["report"]["groups"], 2);
    assert_eq!(json["report"]["pairs"], 2);
    assert_eq!(json["consistent"], true);
    assert_eq!(json["groups"].as_array().map(Vec::len), Some(3));
    assert!(json["generated_at"].is_string());
}

#[test]
fn test_inspect_degenerate_only() {
    let file = snapshot_file(MIXED);
    bankrec()
        .args(["--format", "tsv", "inspect", "--degenerate"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2\t12\t"))
        .stdout(predicate::str::contains("10,11,13").not());
}

#[test]
fn test_inspect_from_stdin() {
    bankrec()
        .args(["inspect", "-"])
        .write_stdin(r#"{"pairs": [{"match_id": 7, "bank_id": "A-1", "gl_id": 9}]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Match 7"))
        .stdout(predicate::str::contains("Bank: A-1"));
}

#[test]
fn test_inspect_rejects_non_object() {
    let file = snapshot_file("[1, 2, 3]");
    bankrec()
        .arg("inspect")
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn test_paired_fans_out_across_groups() {
    let file = snapshot_file(MIXED);
    bankrec()
        .arg("paired")
        .arg(file.path())
        .args(["--bank", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bank-11 (matches: 1, 3)"))
        .stdout(predicate::str::contains("Bank: 10, 11, 13"))
        .stdout(predicate::str::contains("GL: 20, 21"));
}

#[test]
fn test_paired_unmatched_line() {
    let file = snapshot_file(MIXED);
    bankrec()
        .arg("paired")
        .arg(file.path())
        .args(["--gl", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gl-99 is not matched"));
}

#[test]
fn test_paired_requires_a_line() {
    let file = snapshot_file(MIXED);
    bankrec().arg("paired").arg(file.path()).assert().failure();
}

#[test]
fn test_match_without_server_fails() {
    bankrec()
        .args(["match", "--bank", "1", "--gl", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No match endpoint configured"));
}

#[test]
fn test_unmatch_without_server_fails() {
    bankrec()
        .args(["unmatch", "5", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("endpoint configured"));
}

#[test]
fn test_replay_local_events() {
    let file = snapshot_file(MIXED);
    let mut events = NamedTempFile::with_suffix(".jsonl").expect("Failed to create temp file");
    writeln!(events, r#"{{"event": "hover", "side": "gl", "id": 20}}"#).expect("write");
    writeln!(events, r#"{{"event": "select", "side": "bank", "id": 30}}"#).expect("write");

    bankrec()
        .arg("replay")
        .arg(file.path())
        .arg(events.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] hover: paired:"))
        .stdout(predicate::str::contains("[2] select: selected"))
        .stdout(predicate::str::contains("bank-30: unmatched [selected]"));
}

#[test]
fn test_replay_network_event_needs_server() {
    let file = snapshot_file(MIXED);
    let mut events = NamedTempFile::with_suffix(".jsonl").expect("Failed to create temp file");
    writeln!(events, r#"{{"event": "submit"}}"#).expect("write");

    bankrec()
        .arg("replay")
        .arg(file.path())
        .arg(events.path())
        .assert()
        .failure();
}

/// Bodies received by the fake server, per endpoint
#[derive(Clone, Default)]
struct Received {
    matches: Arc<Mutex<Vec<Value>>>,
    unmatches: Arc<Mutex<Vec<Value>>>,
}

impl Received {
    fn matches(&self) -> Vec<Value> {
        self.matches.lock().expect("lock poisoned").clone()
    }

    fn unmatches(&self) -> Vec<Value> {
        self.unmatches.lock().expect("lock poisoned").clone()
    }
}

/// Member ids from either request form
fn requested_ids(body: &Value, side: &str) -> Value {
    match body.get(format!("{side}_line_ids")) {
        Some(ids) => ids.clone(),
        None => json!([body[format!("{side}_line_id")]]),
    }
}

/// Start a reconciliation server on a background thread.
///
/// Create calls are confirmed as match 9 with the requested members unless
/// `match_reply` overrides the answer; delete calls always succeed.
fn start_server(match_reply: Option<(StatusCode, &'static str)>) -> (String, Received) {
    let received = Received::default();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener
        .set_nonblocking(true)
        .expect("Failed to set non-blocking");
    let addr = listener.local_addr().expect("No local address");

    let matches = received.matches.clone();
    let unmatches = received.unmatches.clone();
    let app = Router::new()
        .route(
            "/reconcile/4/match/",
            post(move |request: String| async move {
                let body: Value = serde_json::from_str(&request).unwrap_or(Value::Null);
                matches.lock().expect("lock poisoned").push(body.clone());
                let (status, reply) = match match_reply {
                    Some((status, reply)) => (status, reply.to_string()),
                    None => (
                        StatusCode::OK,
                        json!({
                            "ok": true,
                            "match_id": 9,
                            "bank_lines": requested_ids(&body, "bank"),
                            "gl_lines": requested_ids(&body, "gl"),
                        })
                        .to_string(),
                    ),
                };
                (status, [(header::CONTENT_TYPE, "application/json")], reply)
            }),
        )
        .route(
            "/reconcile/4/unmatch/",
            post(move |request: String| async move {
                let body: Value = serde_json::from_str(&request).unwrap_or(Value::Null);
                unmatches.lock().expect("lock poisoned").push(body);
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"ok": true}"#,
                )
            }),
        );

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");
        rt.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(listener).expect("Failed to adopt listener");
            axum::serve(listener, app).await.expect("Test server failed");
        });
    });

    (format!("http://{addr}"), received)
}

fn with_server(cmd: &mut Command, server: &str) {
    cmd.args(["--server", server, "--session", "4"]);
}

#[test]
fn test_match_single_pair_is_sent_singular() {
    let (server, received) = start_server(None);
    let mut cmd = bankrec();
    cmd.args(["match", "--bank", "1", "--gl", "2"]);
    with_server(&mut cmd, &server);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Matched: match 9 (bank 1; gl 2)"));
    assert_eq!(
        received.matches(),
        vec![json!({"bank_line_id": 1, "gl_line_id": 2})]
    );
}

#[test]
fn test_match_many_lines_is_sent_plural() {
    let (server, received) = start_server(None);
    let mut cmd = bankrec();
    cmd.args(["--format", "json", "match", "--bank", "1", "--bank", "3", "--gl", "2"]);
    with_server(&mut cmd, &server);

    let output = cmd.output().expect("failed to run");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["result"]["outcome"], "matched");
    assert_eq!(json["result"]["bank_lines"], json!([1, 3]));

    assert_eq!(
        received.matches(),
        vec![json!({"bank_line_ids": [1, 3], "gl_line_ids": [2]})]
    );
}

#[test]
fn test_match_rejection_exits_non_zero() {
    let (server, _) = start_server(Some((
        StatusCode::BAD_REQUEST,
        r#"{"ok": false, "error": "amount_mismatch", "bank_amount": "10.00", "gl_amount": "12.00"}"#,
    )));
    let mut cmd = bankrec();
    cmd.args(["match", "--bank", "1", "--gl", "2"]);
    with_server(&mut cmd, &server);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Amounts do not match"));
}

#[test]
fn test_unmatch_reports_reload() {
    let (server, received) = start_server(None);
    let mut cmd = bankrec();
    cmd.args(["unmatch", "3", "--yes"]);
    with_server(&mut cmd, &server);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Match 3 removed"));
    assert_eq!(received.unmatches(), vec![json!({"match_id": 3})]);
}

#[test]
fn test_replay_confirmed_matches_reach_the_board() {
    let (server, received) = start_server(None);
    let file = snapshot_file(r#"{"matches": [{"match_id": 3, "bank_ids": [5], "gl_ids": [6]}]}"#);
    let mut events = NamedTempFile::with_suffix(".jsonl").expect("Failed to create temp file");
    writeln!(events, r#"{{"event": "select", "side": "bank", "id": 1}}"#).expect("write");
    writeln!(events, r#"{{"event": "select", "side": "gl", "id": 2}}"#).expect("write");
    writeln!(events, r#"{{"event": "submit"}}"#).expect("write");
    writeln!(events, r#"{{"event": "drag", "gl": 8, "bank": 7}}"#).expect("write");

    let mut cmd = bankrec();
    cmd.arg("replay").arg(file.path()).arg(events.path());
    with_server(&mut cmd, &server);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[3] submit: Matched: match 9"))
        .stdout(predicate::str::contains("[4] drag: Matched: match 9"))
        .stdout(predicate::str::contains("bank-1: matched"))
        .stdout(predicate::str::contains("gl-8: matched"))
        .stdout(predicate::str::contains("bank-5: matched"));
    assert_eq!(received.matches().len(), 2);
}

/// After a delete the local view is stale, so the replay stops instead of
/// showing a board rebuilt from the old snapshot
#[test]
fn test_replay_stops_after_unmatch() {
    let (server, received) = start_server(None);
    let file = snapshot_file(r#"{"matches": [{"match_id": 3, "bank_ids": [5], "gl_ids": [6]}]}"#);
    let mut events = NamedTempFile::with_suffix(".jsonl").expect("Failed to create temp file");
    writeln!(events, r#"{{"event": "select", "side": "bank", "id": 1}}"#).expect("write");
    writeln!(events, r#"{{"event": "select", "side": "gl", "id": 2}}"#).expect("write");
    writeln!(events, r#"{{"event": "submit"}}"#).expect("write");
    writeln!(events, r#"{{"event": "unmatch", "match_id": 3}}"#).expect("write");
    writeln!(events, r#"{{"event": "hover", "side": "bank", "id": 5}}"#).expect("write");

    let mut cmd = bankrec();
    cmd.args(["--format", "json", "replay"])
        .arg(file.path())
        .arg(events.path());
    with_server(&mut cmd, &server);

    let output = cmd.output().expect("failed to run");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["reload_required"], true);
    assert_eq!(json["not_replayed"], 1);
    assert_eq!(json["steps"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["steps"][3]["result"]["outcome"], "reload_required");
    assert!(json.get("groups").is_none());
    assert!(json.get("board").is_none());

    assert_eq!(received.matches().len(), 1);
    assert_eq!(received.unmatches(), vec![json!({"match_id": 3})]);
}

#[test]
fn test_replay_stops_after_unmatch_text() {
    let (server, _) = start_server(None);
    let file = snapshot_file(r#"{"matches": [{"match_id": 3, "bank_ids": [5], "gl_ids": [6]}]}"#);
    let mut events = NamedTempFile::with_suffix(".jsonl").expect("Failed to create temp file");
    writeln!(events, r#"{{"event": "unmatch", "match_id": 3}}"#).expect("write");
    writeln!(events, r#"{{"event": "unhover"}}"#).expect("write");

    let mut cmd = bankrec();
    cmd.arg("replay").arg(file.path()).arg(events.path());
    with_server(&mut cmd, &server);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Reload required"))
        .stdout(predicate::str::contains("1 events not replayed"))
        .stdout(predicate::str::contains("bank-5").not());
}
