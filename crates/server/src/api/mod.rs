//! HTTP endpoint modules.
//!
//! Each sub-module owns one route group. The response envelope, error
//! mapping and the shared query runner live here in mod.rs.

mod admins;
mod debug;
pub mod doc;
mod health;
mod posts;
mod users;


use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use scrapetok_athena::{AthenaError, Query, Record, SqlError};

use crate::state::AppState;

// ── Shared types ─────────────────────────────────────────────────

/// Limit applied when the caller does not pass one.
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of rows to return (default 10).
    pub limit: Option<u32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecordsResponse {
    pub success: bool,
    /// One object per result row, keyed by column name.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Record>,
}

impl RecordsResponse {
    pub fn ok(data: Vec<Record>) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CountedRecordsResponse {
    pub success: bool,
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Record>,
}

impl CountedRecordsResponse {
    pub fn ok(data: Vec<Record>) -> Json<Self> {
        Json(Self {
            success: true,
            count: data.len(),
            data,
        })
    }
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub detail: String,
}

// ── Errors ───────────────────────────────────────────────────────

/// Failure of a request, mapped to 422 (bad input) or 500 (everything else).
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Query(AthenaError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Validation(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            ApiError::Query(e) => {
                tracing::error!(error = %e, "Query execution failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(ErrorResponse { success: false, detail })).into_response()
    }
}

impl From<AthenaError> for ApiError {
    fn from(e: AthenaError) -> Self {
        ApiError::Query(e)
    }
}

impl From<SqlError> for ApiError {
    fn from(e: SqlError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Apply the default and check `1 <= limit <= max`.
pub(crate) fn checked_limit(limit: Option<u32>, max: u32) -> Result<u32, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if (1..=max).contains(&limit) {
        Ok(limit)
    } else {
        Err(ApiError::Validation(format!(
            "limit must be between 1 and {}, got {}",
            max, limit
        )))
    }
}

/// Run `query` on a separate task tied to this request.
///
/// If the client disconnects, axum drops the handler future, the drop guard
/// fires, and the executor stops the remote job.
pub(crate) async fn run_query(state: &AppState, query: Query) -> Result<Vec<Record>, ApiError> {
    let cancel = CancellationToken::new();
    let executor = state.executor.clone();
    let token = cancel.clone();
    let task = tokio::spawn(async move { executor.run(&query, &token).await });

    let _guard = cancel.drop_guard();
    let records = task
        .await
        .map_err(|e| ApiError::Internal(format!("query task failed: {}", e)))??;
    Ok(records)
}

// ── Re-exports ───────────────────────────────────────────────────
// Flat `api::foo` paths used by router.rs.

pub use admins::admins_questions_and_views;
pub use debug::{debug_describe_table, debug_query, debug_tables};
pub use health::{echo, health};
pub use posts::posts_top;
pub use users::{users_list, users_most_scraped};
