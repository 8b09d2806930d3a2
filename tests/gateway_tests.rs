//! Gateway tests against an in-process HTTP server
//!
//! Each test starts a small axum server on an ephemeral port that answers every
//! call with a canned response and records what it received.

use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};

use bankrec::core::types::{LineId, MatchId, Side};
use bankrec::gateway::client::{HttpGateway, MatchGateway};
use bankrec::gateway::config::GatewayConfig;
use bankrec::gateway::wire::{
    CreateMatchRequest, CreateOutcome, DeleteOutcome, Rejection, TransportFailure,
};

const SESSION_ID: u64 = 4;

/// What the fake server saw
#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<Call>>>,
}

#[derive(Clone, Debug)]
struct Call {
    path: String,
    token: Option<String>,
    body: Value,
}

impl Recorded {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

/// Start a server answering every call with `status` and `body`
async fn serve(status: StatusCode, body: &'static str) -> (String, Recorded) {
    let recorded = Recorded::default();

    let handler = |path: &'static str| {
        let recorded = recorded.clone();
        move |headers: HeaderMap, request: String| async move {
            let token = headers
                .get("x-csrftoken")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            recorded.calls.lock().expect("lock poisoned").push(Call {
                path: path.to_string(),
                token,
                body: serde_json::from_str(&request).unwrap_or(Value::Null),
            });
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }
    };

    let app = Router::new()
        .route("/reconcile/4/match/", post(handler("match")))
        .route("/reconcile/4/unmatch/", post(handler("unmatch")));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    (format!("http://{addr}"), recorded)
}

fn gateway(server: &str, token: Option<&str>) -> HttpGateway {
    let config = GatewayConfig::for_session(server, SESSION_ID)
        .expect("Invalid server URL")
        .with_csrf_token(token.map(str::to_string));
    HttpGateway::new(config).expect("Failed to build gateway")
}

fn lines(ids: &[&str]) -> Vec<LineId> {
    ids.iter().map(|id| LineId::new(*id)).collect()
}

/// Multi-select body goes out plural and the server's member lists win
#[tokio::test]
async fn test_create_multi_uses_server_lists() {
    let (server, recorded) = serve(
        StatusCode::OK,
        r#"{"ok": true, "match_id": 17, "bank_lines": [5, 7], "gl_lines": [6], "bank_amount": "120.00", "gl_amount": "120.00"}"#,
    )
    .await;
    let gateway = gateway(&server, Some("secret-token"));

    let request = CreateMatchRequest::multi(lines(&["5"]), lines(&["6"]));
    let outcome = gateway.create_match(&request).await;

    let CreateOutcome::Success(created) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(created.match_id, MatchId::new("17"));
    assert_eq!(created.bank_lines, lines(&["5", "7"]));
    assert_eq!(created.gl_lines, lines(&["6"]));
    assert_eq!(created.bank_amount.as_deref(), Some("120.00"));

    let calls = recorded.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "match");
    assert_eq!(calls[0].token.as_deref(), Some("secret-token"));
    assert_eq!(
        calls[0].body,
        json!({"bank_line_ids": [5], "gl_line_ids": [6]})
    );
}

/// Drag-and-drop body goes out singular
#[tokio::test]
async fn test_create_single_form_body() {
    let (server, recorded) = serve(StatusCode::OK, r#"{"ok": true, "match_id": 2}"#).await;
    let gateway = gateway(&server, None);

    let request = CreateMatchRequest::single(LineId::new("5"), LineId::new("6"));
    let outcome = gateway.create_match(&request).await;
    assert!(matches!(outcome, CreateOutcome::Success(_)));

    let calls = recorded.calls();
    assert_eq!(calls[0].body, json!({"bank_line_id": 5, "gl_line_id": 6}));
    assert!(calls[0].token.is_none());
}

/// Business errors arrive with HTTP 400 and are still recognized
#[tokio::test]
async fn test_amount_mismatch_on_bad_request() {
    let (server, _) = serve(
        StatusCode::BAD_REQUEST,
        r#"{"ok": false, "error": "amount_mismatch", "bank_amount": "100.00", "gl_amount": "99.50"}"#,
    )
    .await;
    let gateway = gateway(&server, None);

    let outcome = gateway
        .create_match(&CreateMatchRequest::multi(lines(&["1"]), lines(&["2"])))
        .await;
    assert_eq!(
        outcome,
        CreateOutcome::Rejected(Rejection::AmountMismatch {
            bank_amount: "100.00".to_string(),
            gl_amount: "99.50".to_string(),
        })
    );
}

#[tokio::test]
async fn test_already_matched_on_bad_request() {
    let (server, _) = serve(
        StatusCode::BAD_REQUEST,
        r#"{"ok": false, "error": "already_matched", "kind": "bank", "ids": [1]}"#,
    )
    .await;
    let gateway = gateway(&server, None);

    let outcome = gateway
        .create_match(&CreateMatchRequest::multi(lines(&["1"]), lines(&["2"])))
        .await;
    assert_eq!(
        outcome,
        CreateOutcome::Rejected(Rejection::AlreadyMatched {
            side: Side::Bank,
            ids: lines(&["1"]),
        })
    );
}

/// An HTML error page is a transport failure, not a crash
#[tokio::test]
async fn test_non_json_error_page() {
    let (server, _) = serve(
        StatusCode::INTERNAL_SERVER_ERROR,
        "<html><body>Server Error</body></html>",
    )
    .await;
    let gateway = gateway(&server, None);

    let outcome = gateway
        .create_match(&CreateMatchRequest::multi(lines(&["1"]), lines(&["2"])))
        .await;
    assert_eq!(
        outcome,
        CreateOutcome::TransportFailure(TransportFailure::Status(500))
    );
}

#[tokio::test]
async fn test_ok_without_match_id_is_unrecognized() {
    let (server, _) = serve(StatusCode::OK, r#"{"ok": true}"#).await;
    let gateway = gateway(&server, None);

    let outcome = gateway
        .create_match(&CreateMatchRequest::multi(lines(&["1"]), lines(&["2"])))
        .await;
    assert_eq!(
        outcome,
        CreateOutcome::TransportFailure(TransportFailure::Unrecognized)
    );
}

#[tokio::test]
async fn test_delete_match() {
    let (server, recorded) = serve(StatusCode::OK, r#"{"ok": true}"#).await;
    let gateway = gateway(&server, Some("tok"));

    let outcome = gateway.delete_match(&MatchId::new("17")).await;
    assert_eq!(outcome, DeleteOutcome::Deleted);

    let calls = recorded.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "unmatch");
    assert_eq!(calls[0].body, json!({"match_id": 17}));
    assert_eq!(calls[0].token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_delete_refused() {
    let (server, _) = serve(StatusCode::FORBIDDEN, r#"{"ok": false}"#).await;
    let gateway = gateway(&server, None);

    let outcome = gateway.delete_match(&MatchId::new("17")).await;
    assert_eq!(
        outcome,
        DeleteOutcome::TransportFailure(TransportFailure::Status(403))
    );
}
