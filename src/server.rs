// src/server.rs
// =============================================================================
// The HTTP surface of the service.
//
// Routes:
//   POST /actions/qa_message   QaRequest JSON in, QaReport JSON out
//   GET  /healthz              liveness probe
//
// The handler does no QA logic itself: it decodes the body into a QaRequest,
// hands the HTML to the QaEngine and serializes the report. A body that does not fit QaRequest never reaches
// the engine; it gets a 4xx with a small structured error instead.
// =============================================================================

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::qa::QaEngine;
use crate::report::{QaReport, QaRequest};

/// Largest accepted request body unless configured otherwise
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<QaEngine>,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(engine: QaEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/actions/qa_message", post(qa_message))
        .layer(body_limit)
        .with_state(state)
}

// Binds the listener and serves until SIGINT/SIGTERM
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    let local_addr = listener.local_addr()?;

    tracing::info!(%local_addr, "email-qa listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("email-qa stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                tracing::warn!("could not register signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn qa_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<QaReport>, ApiError> {
    let req = decode_request(&headers, body).map_err(|(status, error)| {
        tracing::info!(status = status.as_u16(), code = error.code.as_str(), "rejected qa request");
        (status, error)
    })?;

    // message_id is not part of the report; it only tags this request's logs
    let span = tracing::info_span!(
        "qa_message",
        message_id = req.message_id.as_deref().unwrap_or(""),
        html_bytes = req.html.len()
    );

    let report = async move {
        let report = state.engine.run(&req.html).await;
        tracing::info!(
            findings = report.findings.len(),
            overall = report.overall.as_str(),
            "qa message checked"
        );
        report
    }
    .instrument(span)
    .await;

    Ok(Json(report))
}

// Turns the raw request into a QaRequest
//
// - body over the size limit: 413
// - a Content-Type that is not JSON: 415
// - no Content-Type at all: the body is still parsed as JSON
// - body is not JSON at all: 400
// - JSON that does not fit QaRequest (missing "html", wrong type): 422
fn decode_request(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<QaRequest, ApiError> {
    let body = body.map_err(|rejection| {
        let code = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            "ERR_BODY_TOO_LARGE"
        } else {
            "ERR_UNREADABLE_BODY"
        };
        json_error(rejection.status(), code, rejection.body_text())
    })?;

    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        if !is_json_content_type(content_type) {
            return Err(json_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "ERR_UNSUPPORTED_MEDIA_TYPE",
                "Expected request with `Content-Type: application/json`",
            ));
        }
    }

    serde_json::from_slice::<QaRequest>(&body).map_err(|e| match e.classify() {
        Category::Data => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "ERR_INVALID_REQUEST",
            format!("Failed to deserialize the JSON body into the target type: {}", e),
        ),
        Category::Syntax | Category::Eof | Category::Io => json_error(
            StatusCode::BAD_REQUEST,
            "ERR_MALFORMED_JSON",
            format!("Failed to parse the request body as JSON: {}", e),
        ),
    })
}

// application/json, or any application/*+json, parameters ignored
fn is_json_content_type(value: &HeaderValue) -> bool {
    let Ok(value) = value.to_str() else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message: message.into(),
        }),
    )
}
