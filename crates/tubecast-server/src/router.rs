//! Axum router construction.
//!
//! Builds the application router: the HTML index, the streaming catch-all,
//! the JSON status API under `/api`, and the OpenAPI document.

use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::channels::list_channels,
        routes::channels::tool_status,
    ),
    components(schemas(
        routes::channels::ChannelStatusResponse,
        routes::channels::CachedFileResponse,
        routes::channels::ToolStatusResponse,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/channels", get(routes::channels::list_channels))
        .route("/tools", get(routes::channels::tool_status));

    // The streaming route is a catch-all, so every static path must be
    // registered alongside it; static segments win over the parameter.
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/", get(routes::index::index))
        .nest("/api", api)
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/{file}", get(routes::stream::stream_channel))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
