use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::ExamEvent;
use crate::session::RemoteStatus;

/// Requests to the remote authority. Serializes to the flat JSON objects the
/// wire expects, discriminated by the `action` field.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApiRequest {
    Status {
        token: String,
    },
    Start {
        token: String,
    },
    ListenStarted {
        token: String,
    },
    Submit {
        token: String,
        answers: BTreeMap<String, String>,
        email_text: String,
    },
}

/// Flat response object. `status` and `remaining_seconds` only appear on a
/// successful `status` call; `error` only when `ok` is false.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApiResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub status: Option<RemoteStatus>,
    #[serde(default, rename = "remainingSeconds")]
    pub remaining_seconds: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Failure taxonomy for authority calls. Call sites pattern-match on the
/// kind instead of string-matching error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No token in hand; authoritative actions are disabled.
    MissingToken,
    /// The authority does not recognize the token.
    InvalidToken,
    /// The attempt behind this token is already spent.
    AlreadyUsed,
    /// Any other rejection the authority reports.
    Rejected(String),
    /// Network failure, non-2xx response, or an unreadable body.
    Transport(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingToken => write!(f, "missing token"),
            ApiError::InvalidToken => write!(f, "invalid token"),
            ApiError::AlreadyUsed => write!(f, "already used"),
            ApiError::Rejected(e) => write!(f, "rejected: {e}"),
            ApiError::Transport(e) => write!(f, "server error: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Maps a decoded response onto the error taxonomy.
pub fn classify(resp: ApiResponse) -> Result<ApiResponse, ApiError> {
    if resp.ok {
        return Ok(resp);
    }
    Err(match resp.error.as_deref() {
        Some("invalid_token") => ApiError::InvalidToken,
        Some("already_used") => ApiError::AlreadyUsed,
        Some(other) => ApiError::Rejected(other.to_string()),
        None => ApiError::Rejected("unknown".to_string()),
    })
}

/// Seam between the exam flow and the wire. Production talks HTTP through
/// the relay; tests script replies.
pub trait AuthorityClient: Send + Sync {
    fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Blocking JSON-over-POST client. Always used from worker threads, never
/// from the event loop itself.
pub struct HttpClient {
    endpoint: String,
    http: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(endpoint: String) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { endpoint, http })
    }
}

impl AuthorityClient for HttpClient {
    fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ApiError::Transport(format!("HTTP {}", resp.status())));
        }

        let decoded: ApiResponse = resp
            .json()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        classify(decoded)
    }
}

/// Which in-flight call a reply belongs to, so the event loop can route a
/// completion that may arrive late.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCall {
    Status,
    Start,
    Submit,
}

#[derive(Debug, Clone)]
pub struct ApiReply {
    pub call: ApiCall,
    pub result: Result<ApiResponse, ApiError>,
}

/// Dispatches authority calls on background threads and reports completions
/// on the app's event channel. Requests are non-cancellable; the session
/// machine tolerates stale replies.
#[derive(Clone)]
pub struct ApiWorker {
    client: Arc<dyn AuthorityClient>,
    tx: Sender<ExamEvent>,
}

impl ApiWorker {
    pub fn new(client: Arc<dyn AuthorityClient>, tx: Sender<ExamEvent>) -> Self {
        Self { client, tx }
    }

    /// Fires `request` and posts the outcome back as an `ExamEvent`.
    pub fn dispatch(&self, call: ApiCall, request: ApiRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.call(&request);
            // The loop may already be gone on shutdown
            let _ = tx.send(ExamEvent::Api(ApiReply { call, result }));
        });
    }

    /// Best-effort telemetry: failures are logged, never surfaced, never
    /// retried, and no completion event is produced.
    pub fn notify_listen_started(&self, token: String) {
        let client = Arc::clone(&self.client);
        thread::spawn(move || {
            if let Err(err) = client.call(&ApiRequest::ListenStarted { token }) {
                tracing::warn!(%err, "listen_started notification failed");
            }
        });
    }
}
