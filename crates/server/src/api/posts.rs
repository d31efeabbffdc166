use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::queries;
use crate::state::AppState;

use super::{checked_limit, run_query, ApiError, CountedRecordsResponse, ErrorResponse, LimitParams};

/// Posts route allows a smaller page than the others.
const MAX_LIMIT: u32 = 100;

/// Most viewed posts.
#[utoipa::path(
    get,
    path = "/posts/top",
    tag = "Posts",
    params(LimitParams),
    responses(
        (status = 200, description = "Posts ordered by views", body = CountedRecordsResponse),
        (status = 422, description = "Invalid limit (1-100)", body = ErrorResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn posts_top(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<CountedRecordsResponse>, ApiError> {
    let Query(params) = params?;
    let limit = checked_limit(params.limit, MAX_LIMIT)?;

    let records = run_query(&state, queries::posts_top(limit)).await?;
    Ok(CountedRecordsResponse::ok(records))
}
