//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "scrapetok-gateway API",
        version = "0.1.0",
        description = "Analytics queries over AWS Athena, returned as JSON rows.",
    ),
    tags(
        (name = "Health", description = "Liveness and echo"),
        (name = "Users", description = "User scraping analytics"),
        (name = "Admins", description = "Admin activity analytics"),
        (name = "Posts", description = "Post performance"),
        (name = "Debug", description = "Schema introspection and raw SQL (only when debug routes are enabled)"),
    ),
    paths(
        crate::api::health::health,
        crate::api::health::echo,
        crate::api::users::users_most_scraped,
        crate::api::users::users_list,
        crate::api::admins::admins_questions_and_views,
        crate::api::posts::posts_top,
        crate::api::debug::debug_tables,
        crate::api::debug::debug_describe_table,
        crate::api::debug::debug_query,
    ),
    components(schemas(
        crate::api::RecordsResponse,
        crate::api::CountedRecordsResponse,
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::health::EchoRequest,
        crate::api::health::EchoResponse,
        crate::api::debug::SqlQueryRequest,
    ))
)]
pub struct ApiDoc;
