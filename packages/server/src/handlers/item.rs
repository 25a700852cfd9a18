use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use crate::catalog::{self, NewItem};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::ledger::{FALLBACK_UNIT, UNCATEGORIZED};
use crate::models::item::*;
use crate::models::shared::validate_name;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/items",
    tag = "Items",
    operation_id = "listItems",
    summary = "List catalog items",
    description = "Returns every item ordered by id.",
    responses(
        (status = 200, description = "All items", body = Vec<ItemResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = catalog::list_items(&state.db).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/items",
    tag = "Items",
    operation_id = "createItem",
    summary = "Add an item to the catalog",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let name = validate_name(&payload.name, "name")?.to_string();
    if let Some(days) = payload.shelf_life_days_default
        && days < 0
    {
        return Err(AppError::Validation(
            "shelf_life_days_default must be >= 0".into(),
        ));
    }

    let non_blank = |v: Option<String>, fallback: &str| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    let new_item = NewItem {
        name,
        category: non_blank(payload.category, UNCATEGORIZED),
        default_unit: non_blank(payload.default_unit, FALLBACK_UNIT),
        shelf_life_days_default: payload.shelf_life_days_default,
    };

    let created = catalog::create_item(&state.db, &new_item)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Item '{}' already exists", new_item.name)))?;

    info!(item_id = created.id, name = %created.name, "Item created");
    Ok((StatusCode::CREATED, Json(created.into())))
}
