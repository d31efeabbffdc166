//! Debugging endpoints: table listing, table description and raw SQL.
//!
//! Registered only when debug routes are enabled; see `router.rs`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use scrapetok_athena::Query;

use crate::queries;
use crate::state::AppState;

use super::{run_query, ApiError, CountedRecordsResponse, ErrorResponse, RecordsResponse};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SqlQueryRequest {
    /// SQL executed verbatim against the configured database.
    #[schema(example = "SELECT userId, COUNT(*) AS total FROM scraped_acount GROUP BY userId")]
    pub query: String,
}

/// Tables in the configured database.
#[utoipa::path(
    get,
    path = "/debug/tables",
    tag = "Debug",
    responses(
        (status = 200, description = "Table names", body = CountedRecordsResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn debug_tables(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CountedRecordsResponse>, ApiError> {
    let query = queries::list_tables(&state.executor.settings().database);
    let records = run_query(&state, query).await?;
    Ok(CountedRecordsResponse::ok(records))
}

/// Column names and types of one table.
#[utoipa::path(
    get,
    path = "/debug/describe/{table_name}",
    tag = "Debug",
    params(("table_name" = String, Path, description = "Table name, optionally `schema.table`")),
    responses(
        (status = 200, description = "Columns", body = RecordsResponse),
        (status = 422, description = "Invalid table name", body = ErrorResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn debug_describe_table(
    State(state): State<Arc<AppState>>,
    Path(table_name): Path<String>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let query = queries::describe_table(&table_name, &state.executor.settings().database)?;
    let records = run_query(&state, query).await?;
    Ok(RecordsResponse::ok(records))
}

/// Execute arbitrary SQL. No safeguards beyond the debug-routes switch.
#[utoipa::path(
    post,
    path = "/debug/query",
    tag = "Debug",
    request_body = SqlQueryRequest,
    responses(
        (status = 200, description = "Query rows", body = CountedRecordsResponse),
        (status = 422, description = "Missing or empty query", body = ErrorResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn debug_query(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SqlQueryRequest>, JsonRejection>,
) -> Result<Json<CountedRecordsResponse>, ApiError> {
    let Json(req) = body?;
    if req.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".into()));
    }

    tracing::warn!(sql = %req.query, "Executing raw SQL from /debug/query");
    let records = run_query(&state, Query::new(req.query)).await?;
    Ok(CountedRecordsResponse::ok(records))
}
