//! Liveness and echo endpoints.
//!
//! Neither touches Athena.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

use super::{ApiError, ErrorResponse};

const MAX_ECHO_CHARS: usize = 500;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether an Athena client was built at startup.
    pub athena_ready: bool,
    pub debug_routes: bool,
}

/// Server liveness and executor readiness.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        athena_ready: state.executor.is_initialized(),
        debug_routes: state.debug_routes,
    })
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EchoRequest {
    /// Message returned unchanged (1-500 characters).
    #[schema(example = "Hello World")]
    pub message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EchoResponse {
    pub echo: String,
}

/// Return the posted message.
#[utoipa::path(
    post,
    path = "/echo",
    tag = "Health",
    request_body = EchoRequest,
    responses(
        (status = 200, description = "Echoed message", body = EchoResponse),
        (status = 422, description = "Invalid message", body = ErrorResponse)
    )
)]
pub async fn echo(
    body: Result<Json<EchoRequest>, JsonRejection>,
) -> Result<Json<EchoResponse>, ApiError> {
    let Json(req) = body?;
    let len = req.message.chars().count();
    if len == 0 || len > MAX_ECHO_CHARS {
        return Err(ApiError::Validation(format!(
            "message must be between 1 and {} characters",
            MAX_ECHO_CHARS
        )));
    }
    Ok(Json(EchoResponse { echo: req.message }))
}
