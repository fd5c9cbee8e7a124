use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::RelayError;
use crate::relay::RelayService;
use crate::util::elapsed_ms;

/// Request body shared by both generation endpoints. Fields are kept loose so a
/// wrongly-typed field becomes a validation error rather than a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    pub prompt: Option<Value>,
    pub mode: Option<Value>,
    pub max_tokens: Option<Value>,
}

impl GenerateBody {
    fn prompt(&self) -> Option<&str> {
        self.prompt.as_ref().and_then(Value::as_str)
    }

    fn mode(&self) -> Option<&str> {
        self.mode.as_ref().and_then(Value::as_str)
    }
}

/// `POST /generate`
pub async fn generate(
    State(relay): State<Arc<RelayService>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match relay
        .generate(body.prompt(), body.mode(), body.max_tokens.as_ref())
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e, start),
    }
}

/// `POST /generate-simple`
pub async fn generate_simple(
    State(relay): State<Arc<RelayService>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match relay.generate_simple(body.prompt()).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e, start),
    }
}

fn invalid_body(rejection: JsonRejection) -> Response {
    tracing::debug!("rejected request body: {rejection}");
    error_response(
        RelayError::Validation(format!("Invalid request body: {}", rejection.body_text())),
        Instant::now(),
    )
}

/// Render a failure as `{"success": false, "error": ...}` with 400 or 500.
fn error_response(err: RelayError, start: Instant) -> Response {
    if err.is_client_error() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": err })),
        )
            .into_response();
    }

    tracing::error!("generation failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": err,
            "elapsed_ms": elapsed_ms(start),
        })),
    )
        .into_response()
}
