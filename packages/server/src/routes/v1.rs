use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::dashboard::get_summary))
        .merge(batch_routes())
        .merge(catalog_routes())
        .merge(image_routes(config))
        .merge(detection_routes())
}

fn batch_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::batch::list_batches,
            handlers::batch::create_batch
        ))
        .routes(routes!(handlers::batch::bulk_create_batches))
        .routes(routes!(handlers::batch::list_expiring))
        .routes(routes!(
            handlers::batch::get_batch,
            handlers::batch::update_batch
        ))
        .routes(routes!(handlers::batch::consume_batch))
        .routes(routes!(handlers::batch::discard_batch))
        .routes(routes!(handlers::batch::list_batch_events))
        .routes(routes!(handlers::batch::list_events))
}

fn catalog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::item::list_items,
            handlers::item::create_item
        ))
        .routes(routes!(handlers::recipe::list_recipes))
        .routes(routes!(handlers::recipe::list_feasible_recipes))
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .layer(handlers::image::image_upload_body_limit(
            config.storage.max_blob_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::image::get_image))
        .routes(routes!(handlers::image::get_image_content))
        .merge(upload)
}

fn detection_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::detection::list_providers))
        .routes(routes!(handlers::detection::detect))
}
