pub mod catalog;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod expiry;
pub mod extractors;
pub mod handlers;
pub mod images;
pub mod ledger;
pub mod models;
pub mod recipes;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;
pub mod vision;

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Larder API",
        version = "1.0.0",
        description = "Household inventory batch ledger with photo-based intake"
    ),
    tags(
        (name = "Dashboard", description = "Inventory counters"),
        (name = "Batches", description = "Batch lifecycle and event log"),
        (name = "Items", description = "Item catalog"),
        (name = "Recipes", description = "Recipe feasibility against current stock"),
        (name = "Images", description = "Photo uploads"),
        (name = "Detection", description = "Vision providers and candidate batches"),
    ),
)]
struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let cors = cors_layer(&state.config.server.cors);

    router
        .with_state(state)
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}
