//! HTTP router construction.
//!
//! Assembles all Axum routes, CORS, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(api::health))
        .route("/echo", post(api::echo))
        .route("/users/most_scraped", get(api::users_most_scraped))
        .route("/users/list", get(api::users_list))
        .route(
            "/admins/questions_and_views",
            get(api::admins_questions_and_views),
        )
        .route("/posts/top", get(api::posts_top));

    if state.debug_routes {
        app = app
            .route("/debug/tables", get(api::debug_tables))
            .route("/debug/describe/{table_name}", get(api::debug_describe_table))
            .route("/debug/query", post(api::debug_query));
    }

    let cors = cors_layer(&state.cors_origin);

    app.layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

/// `*` allows any origin; anything else is a single allowed origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin = %origin, "Invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}
