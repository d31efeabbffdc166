use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::queries;
use crate::state::AppState;

use super::{checked_limit, run_query, ApiError, ErrorResponse, RecordsResponse};

const MAX_LIMIT: u32 = 1000;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminParams {
    /// Value compared against `admin_profiles.is_active`.
    pub is_active: String,
    /// Maximum number of rows to return (default 10).
    pub limit: Option<u32>,
}

/// Admins with questions answered and average video views.
#[utoipa::path(
    get,
    path = "/admins/questions_and_views",
    tag = "Admins",
    params(AdminParams),
    responses(
        (status = 200, description = "Admins ranked by questions answered", body = RecordsResponse),
        (status = 422, description = "Missing is_active or invalid limit", body = ErrorResponse),
        (status = 500, description = "Query error", body = ErrorResponse)
    )
)]
pub async fn admins_questions_and_views(
    State(state): State<Arc<AppState>>,
    params: Result<Query<AdminParams>, QueryRejection>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let Query(params) = params?;
    let limit = checked_limit(params.limit, MAX_LIMIT)?;

    let query = queries::admins_questions_and_views(&params.is_active, limit);
    let records = run_query(&state, query).await?;
    Ok(RecordsResponse::ok(records))
}
