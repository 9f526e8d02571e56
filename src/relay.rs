use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::json;
use std::env;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Relay settings, read from the environment (`.env` supported via dotenvy
/// in the binary).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Remote authority URL the body is forwarded to.
    pub upstream_url: String,
    /// Listen address, `host:port`.
    pub listen_addr: String,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let upstream_url = env::var("INVIGIL_UPSTREAM_URL").expect("INVIGIL_UPSTREAM_URL must be set");
        let listen_addr =
            env::var("INVIGIL_RELAY_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
        Self {
            upstream_url,
            listen_addr,
        }
    }
}

#[derive(Clone)]
pub struct RelayState {
    upstream_url: String,
    http: reqwest::Client,
}

impl RelayState {
    pub fn new(upstream_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { upstream_url, http }
    }
}

/// Assembles the relay router.
///
/// The relay is a stateless pass-through: it owns no exam state and makes no
/// decisions beyond method dispatch. Permissive CORS is the whole point of
/// its existence.
pub fn create_router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", any(dispatch))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn dispatch(State(state): State<RelayState>, method: Method, body: Bytes) -> Response {
    match method {
        Method::POST => forward(state, body).await,
        // Preflight: 200, empty body; the cors layer attaches the headers
        Method::OPTIONS => StatusCode::OK.into_response(),
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "ok": false, "error": "method_not_allowed" })),
        )
            .into_response(),
    }
}

/// Forwards the body verbatim and mirrors the upstream status and body.
async fn forward(state: RelayState, body: Bytes) -> Response {
    let sent = state
        .http
        .post(&state.upstream_url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await;

    match sent {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status().as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            match upstream.bytes().await {
                Ok(bytes) => (
                    status,
                    [(header::CONTENT_TYPE, "application/json")],
                    bytes,
                )
                    .into_response(),
                Err(err) => transport_error(err),
            }
        }
        Err(err) => transport_error(err),
    }
}

fn transport_error(err: reqwest::Error) -> Response {
    tracing::error!(%err, "upstream request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": err.to_string() })),
    )
        .into_response()
}
