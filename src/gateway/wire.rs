use serde::Serialize;
use serde_json::Value;

use crate::core::types::{LineId, MatchId, Side};

/// Which request body shape to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestForm {
    /// `{bank_line_id, gl_line_id}`, sent by drag-and-drop
    Single,
    /// `{bank_line_ids: [...], gl_line_ids: [...]}`, sent by multi-select
    Multi,
}

/// A request to group the listed lines into one new match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMatchRequest {
    pub bank_ids: Vec<LineId>,
    pub gl_ids: Vec<LineId>,
    pub form: RequestForm,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CreateBody<'a> {
    Single {
        bank_line_id: &'a LineId,
        gl_line_id: &'a LineId,
    },
    Multi {
        bank_line_ids: &'a [LineId],
        gl_line_ids: &'a [LineId],
    },
}

impl CreateMatchRequest {
    pub fn single(bank_id: LineId, gl_id: LineId) -> Self {
        Self {
            bank_ids: vec![bank_id],
            gl_ids: vec![gl_id],
            form: RequestForm::Single,
        }
    }

    pub fn multi(bank_ids: Vec<LineId>, gl_ids: Vec<LineId>) -> Self {
        Self {
            bank_ids,
            gl_ids,
            form: RequestForm::Multi,
        }
    }

    /// JSON body as the server expects it
    pub fn body(&self) -> Value {
        let body = match (self.form, self.bank_ids.as_slice(), self.gl_ids.as_slice()) {
            (RequestForm::Single, [bank], [gl]) => CreateBody::Single {
                bank_line_id: bank,
                gl_line_id: gl,
            },
            // A single-form request with other than one id per side goes out plural
            _ => CreateBody::Multi {
                bank_line_ids: &self.bank_ids,
                gl_line_ids: &self.gl_ids,
            },
        };
        serde_json::json!(body)
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteMatchRequest<'a> {
    pub match_id: &'a MatchId,
}

/// A confirmed match as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCreated {
    pub match_id: MatchId,

    /// Authoritative bank membership (server list, or the requested ids when
    /// the response carries none)
    pub bank_lines: Vec<LineId>,

    /// Authoritative GL membership, same fallback rule
    pub gl_lines: Vec<LineId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_amount: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gl_amount: Option<String>,
}

/// The server understood the request and declined it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    AmountMismatch {
        bank_amount: String,
        gl_amount: String,
    },
    AlreadyMatched {
        side: Side,
        /// Offending line ids when the server lists them
        #[serde(skip_serializing_if = "Vec::is_empty")]
        ids: Vec<LineId>,
    },
}

/// Why a call produced no usable answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum TransportFailure {
    /// Non-success HTTP status without a recognizable body
    Status(u16),
    /// Body was not JSON
    InvalidBody,
    /// JSON that matches none of the known response shapes
    Unrecognized,
    /// The request never completed
    Network(String),
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::InvalidBody => write!(f, "response body is not JSON"),
            Self::Unrecognized => write!(f, "unrecognized response"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
        }
    }
}

/// Normalized result of a create-match call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Success(MatchCreated),
    Rejected(Rejection),
    TransportFailure(TransportFailure),
}

/// Normalized result of a delete-match call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    TransportFailure(TransportFailure),
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Amounts arrive as decimal strings, numbers are accepted too
fn amount(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `None` when the field is absent or null, otherwise the valid ids in it
fn id_list(value: Option<&Value>) -> Option<Vec<LineId>> {
    let items = value?.as_array()?;
    Some(items.iter().filter_map(LineId::from_json).collect())
}

fn parse_rejection(body: &Value) -> Option<Rejection> {
    match body.get("error")?.as_str()? {
        "amount_mismatch" => Some(Rejection::AmountMismatch {
            bank_amount: amount(body.get("bank_amount"))?,
            gl_amount: amount(body.get("gl_amount"))?,
        }),
        "already_matched" => Some(Rejection::AlreadyMatched {
            side: Side::parse(body.get("kind")?.as_str()?)?,
            ids: id_list(body.get("ids")).unwrap_or_default(),
        }),
        _ => None,
    }
}

/// Turn a create-match HTTP answer into a [`CreateOutcome`].
///
/// Business errors are recognized whatever the status code, since the server
/// answers them with 400. Success requires a 2xx status, `ok: true` and a match
/// id; the member lists fall back to the request when the body omits them.
pub fn interpret_create(request: &CreateMatchRequest, status: u16, body: &[u8]) -> CreateOutcome {
    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        let failure = if is_success(status) {
            TransportFailure::InvalidBody
        } else {
            TransportFailure::Status(status)
        };
        return CreateOutcome::TransportFailure(failure);
    };

    if let Some(rejection) = parse_rejection(&json) {
        return CreateOutcome::Rejected(rejection);
    }

    if !is_success(status) {
        return CreateOutcome::TransportFailure(TransportFailure::Status(status));
    }

    let ok = json.get("ok").and_then(Value::as_bool).unwrap_or(false);
    let match_id = json.get("match_id").and_then(MatchId::from_json);
    let (true, Some(match_id)) = (ok, match_id) else {
        return CreateOutcome::TransportFailure(TransportFailure::Unrecognized);
    };

    CreateOutcome::Success(MatchCreated {
        match_id,
        bank_lines: id_list(json.get("bank_lines")).unwrap_or_else(|| request.bank_ids.clone()),
        gl_lines: id_list(json.get("gl_lines")).unwrap_or_else(|| request.gl_ids.clone()),
        bank_amount: amount(json.get("bank_amount")),
        gl_amount: amount(json.get("gl_amount")),
    })
}

/// Turn a delete-match HTTP answer into a [`DeleteOutcome`]
pub fn interpret_delete(status: u16, body: &[u8]) -> DeleteOutcome {
    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        let failure = if is_success(status) {
            TransportFailure::InvalidBody
        } else {
            TransportFailure::Status(status)
        };
        return DeleteOutcome::TransportFailure(failure);
    };

    if !is_success(status) {
        return DeleteOutcome::TransportFailure(TransportFailure::Status(status));
    }

    if json.get("ok").and_then(Value::as_bool) == Some(true) {
        DeleteOutcome::Deleted
    } else {
        DeleteOutcome::TransportFailure(TransportFailure::Unrecognized)
    }
}
