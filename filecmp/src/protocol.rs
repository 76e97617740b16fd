//! Wire types for the JSON-lines server.
//!
//! Every input line is one request object tagged by `method`; every output
//! line is one response object carrying either `result` or `error`. Requests
//! are answered out of order, so each response echoes the request `id` (or a
//! fresh UUID when the request had none).
//!
//! Request and outcome values are fully owned so they can move between the
//! reader task, the worker threads and the writer task.

use std::time::Duration;

use filecmp_core::{
    CompareError, CompareRequest, CompareResponse, FileContent, FileTreeNode, FsError, Side,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Greeting returned by the `hello` method.
pub const GREETING: &str = "File Compare API";

/// One request, tagged by its `method` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    Hello,
    ListFiles { directory: String },
    FileContent { file_path: String },
    Compare(CompareRequest),
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Hello => "hello",
            Request::ListFiles { .. } => "list_files",
            Request::FileContent { .. } => "file_content",
            Request::Compare(_) => "compare",
        }
    }
}

/// A decoded input line. `request` is `Err` with a human-readable detail
/// when the line was not a valid request; the id is still recovered when
/// the line was at least a JSON object.
#[derive(Debug)]
pub struct Incoming {
    pub id: Value,
    pub request: Result<Request, String>,
}

/// Decodes one input line.
pub fn decode(line: &str) -> Incoming {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return Incoming {
                id: fresh_id(),
                request: Err(format!("malformed JSON: {e}")),
            }
        }
    };

    let id = match value.get("id") {
        Some(Value::Null) | None => fresh_id(),
        Some(id) => id.clone(),
    };
    let request = serde_json::from_value(value).map_err(|e| format!("invalid request: {e}"));
    Incoming { id, request }
}

fn fresh_id() -> Value {
    Value::String(uuid::Uuid::new_v4().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub message: String,
}

impl Default for Greeting {
    fn default() -> Self {
        Self { message: GREETING.to_owned() }
    }
}

/// Successful result body; serialized as the bare inner value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Hello(Greeting),
    Tree(FileTreeNode),
    Content(FileContent),
    Compare(CompareResponse),
}

/// Error body shared by every method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable snake_case identifier, e.g. `not_found`.
    pub kind: String,
    /// HTTP-style status code.
    pub status: u16,
    pub detail: String,
    /// The offending file for compare failures, `null` otherwise.
    pub side: Option<Side>,
}

impl ErrorBody {
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self { kind: "invalid_request".to_owned(), status: 400, detail: detail.into(), side: None }
    }

    pub fn timeout(deadline: Duration) -> Self {
        Self {
            kind: "timeout".to_owned(),
            status: 504,
            detail: format!("request did not finish within {}s", deadline.as_secs()),
            side: None,
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self { kind: "internal".to_owned(), status: 500, detail: detail.into(), side: None }
    }
}

impl From<&FsError> for ErrorBody {
    fn from(e: &FsError) -> Self {
        Self { kind: e.kind().to_owned(), status: e.status(), detail: e.to_string(), side: None }
    }
}

impl From<&CompareError> for ErrorBody {
    fn from(e: &CompareError) -> Self {
        Self {
            kind: e.kind().to_owned(),
            status: e.status(),
            detail: e.to_string(),
            side: Some(e.side),
        }
    }
}

/// What a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Result(Payload),
    Error(ErrorBody),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}
