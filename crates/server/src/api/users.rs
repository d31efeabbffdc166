//! User analytics endpoints.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::queries;
use crate::state::AppState;

use super::{checked_limit, run_query, ApiError, CountedRecordsResponse, ErrorResponse, LimitParams, RecordsResponse};

const MAX_LIMIT: u32 = 1000;

/// Users with the most scraped accounts and their active filter count.
#[utoipa::path(
    get,
    path = "/users/most_scraped",
    tag = "Users",
    params(LimitParams),
    responses(
        (status = 200, description = "Users ranked by scraped accounts", body = RecordsResponse),
        (status = 422, description = "Invalid limit", body = ErrorResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn users_most_scraped(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let Query(params) = params?;
    let limit = checked_limit(params.limit, MAX_LIMIT)?;

    let records = run_query(&state, queries::users_most_scraped(limit)).await?;
    Ok(RecordsResponse::ok(records))
}

/// Plain user listing.
#[utoipa::path(
    get,
    path = "/users/list",
    tag = "Users",
    params(LimitParams),
    responses(
        (status = 200, description = "Users", body = CountedRecordsResponse),
        (status = 422, description = "Invalid limit", body = ErrorResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn users_list(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<CountedRecordsResponse>, ApiError> {
    let Query(params) = params?;
    let limit = checked_limit(params.limit, MAX_LIMIT)?;

    let records = run_query(&state, queries::users_list(limit)).await?;
    Ok(CountedRecordsResponse::ok(records))
}
