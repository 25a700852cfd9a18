use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use common::{BatchStatus, StorageLocation};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::expiry::{self, MAX_HORIZON_DAYS};
use crate::extractors::json::AppJson;
use crate::images;
use crate::ledger::{BatchFilter, BatchSource};
use crate::models::batch::*;
use crate::models::shared::{Pagination, parse_optional};
use crate::state::AppState;
use crate::utils::clock::today;

/// List batches.
#[utoipa::path(
    get,
    path = "/batches",
    tag = "Batches",
    operation_id = "listBatches",
    summary = "List batches with filters and pagination",
    description = "Returns batches newest first. Filter by `location`, `status` and a case-insensitive `keyword` matched against the item name.",
    params(BatchListQuery),
    responses(
        (status = 200, description = "Page of batches", body = BatchListResponse),
        (status = 400, description = "Unknown filter value (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchListQuery>,
) -> Result<Json<BatchListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let filter = BatchFilter {
        location: parse_optional::<StorageLocation>(query.location.as_deref())?,
        status: parse_optional::<BatchStatus>(query.status.as_deref())?,
        keyword: query.keyword,
        page,
        per_page,
    };
    let (batches, total) = state.ledger.list_batches(&filter).await?;

    Ok(Json(BatchListResponse {
        data: batches.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// Create a batch by hand.
#[utoipa::path(
    post,
    path = "/batches",
    tag = "Batches",
    operation_id = "createBatch",
    summary = "Create a batch",
    description = "Creates an `in_stock` batch and its `created` event. Unknown item names create the item.",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = BatchResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Item id unknown (ITEM_NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Quantity not positive (INVALID_QUANTITY)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_batch(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), AppError> {
    let spec = payload.into_new_batch()?;
    let batch = state.ledger.create_batch(spec, BatchSource::Manual).await?;
    Ok((StatusCode::CREATED, Json(batch.into())))
}

/// Create several batches atomically.
#[utoipa::path(
    post,
    path = "/batches/bulk",
    tag = "Batches",
    operation_id = "bulkCreateBatches",
    summary = "Create batches in one transaction",
    description = "Stores reviewed detections or manual entries. Either every batch is created or none is. \
        With `image_id`, every `created` event notes `image:<image_id>`.",
    request_body = BulkCreateBatchesRequest,
    responses(
        (status = 201, description = "Batches created", body = BulkCreateBatchesResponse),
        (status = 400, description = "Empty or malformed list (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown item or image (ITEM_NOT_FOUND, IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "A quantity is not positive (INVALID_QUANTITY)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn bulk_create_batches(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkCreateBatchesRequest>,
) -> Result<(StatusCode, Json<BulkCreateBatchesResponse>), AppError> {
    let source = match payload.image_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            let image = images::find_image(&state.db, id).await?;
            BatchSource::Image(image.id.to_string())
        }
        _ => BatchSource::Manual,
    };

    let specs = payload
        .batches
        .into_iter()
        .map(CreateBatchRequest::into_new_batch)
        .collect::<Result<Vec<_>, _>>()?;

    let created = state.ledger.bulk_create_batches(source, specs).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateBatchesResponse {
            data: created.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// Batches that expire soon.
#[utoipa::path(
    get,
    path = "/batches/expiring",
    tag = "Batches",
    operation_id = "listExpiringBatches",
    summary = "List in-stock batches expiring within a horizon",
    description = "Includes already expired batches. Ordered by days left, then batch id. Days left are computed against today's date on every call.",
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Expiring batches", body = ExpiringListResponse),
        (status = 400, description = "Horizon out of range (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_expiring(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<ExpiringListResponse>, AppError> {
    let horizon = query
        .days
        .unwrap_or(state.config.inventory.expiring_horizon_days);
    if !(-MAX_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon) {
        return Err(AppError::Validation(format!(
            "days must be between -{MAX_HORIZON_DAYS} and {MAX_HORIZON_DAYS}"
        )));
    }

    let mut ranked = expiry::list_expiring(&state.db, horizon, today()).await?;
    if let Some(limit) = query.limit {
        ranked.truncate(limit);
    }

    Ok(Json(ExpiringListResponse {
        horizon_days: horizon,
        data: ranked.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/batches/{id}",
    tag = "Batches",
    operation_id = "getBatch",
    summary = "Get a batch by ID",
    params(("id" = i32, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch details", body = BatchResponse),
        (status = 404, description = "Batch not found (BATCH_NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BatchResponse>, AppError> {
    Ok(Json(state.ledger.get_batch(id).await?.into()))
}

/// Patch quantity, expiry date or location.
#[utoipa::path(
    patch,
    path = "/batches/{id}",
    tag = "Batches",
    operation_id = "updateBatch",
    summary = "Update an in-stock batch",
    description = "A quantity change is recorded as an `adjusted` event. The new quantity must be greater than zero; use consume or discard to empty a batch.",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = UpdateBatchRequest,
    responses(
        (status = 200, description = "Batch updated", body = BatchResponse),
        (status = 400, description = "Empty patch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Batch not found (BATCH_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Batch already consumed or discarded (BATCH_TERMINAL)", body = ErrorBody),
        (status = 422, description = "Quantity not positive (INVALID_QUANTITY)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let batch = state.ledger.update_batch(id, payload.into()).await?;
    Ok(Json(batch.into()))
}

#[utoipa::path(
    post,
    path = "/batches/{id}/consume",
    tag = "Batches",
    operation_id = "consumeBatch",
    summary = "Consume part or all of a batch",
    description = "Appends a `consumed` event. Consuming the remaining quantity marks the batch `consumed`.",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = ConsumeBatchRequest,
    responses(
        (status = 200, description = "Batch after consumption", body = BatchResponse),
        (status = 404, description = "Batch not found (BATCH_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Batch already consumed or discarded (BATCH_TERMINAL)", body = ErrorBody),
        (status = 422, description = "Quantity not positive or above remaining (INVALID_QUANTITY)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn consume_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ConsumeBatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let batch = state
        .ledger
        .consume_batch(id, payload.quantity, payload.note)
        .await?;
    Ok(Json(batch.into()))
}

#[utoipa::path(
    post,
    path = "/batches/{id}/discard",
    tag = "Batches",
    operation_id = "discardBatch",
    summary = "Discard part or all of a batch",
    description = "Appends a `discarded` event with the reason as its note. Discarding the remaining quantity marks the batch `discarded`.",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = DiscardBatchRequest,
    responses(
        (status = 200, description = "Batch after discard", body = BatchResponse),
        (status = 404, description = "Batch not found (BATCH_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Batch already consumed or discarded (BATCH_TERMINAL)", body = ErrorBody),
        (status = 422, description = "Quantity not positive or above remaining (INVALID_QUANTITY)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn discard_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<DiscardBatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let batch = state
        .ledger
        .discard_batch(id, payload.quantity, payload.reason)
        .await?;
    Ok(Json(batch.into()))
}

#[utoipa::path(
    get,
    path = "/batches/{id}/events",
    tag = "Batches",
    operation_id = "listBatchEvents",
    summary = "List a batch's events in replay order",
    description = "Summing `delta_quantity` in order reproduces the batch's current quantity.",
    params(("id" = i32, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Events, oldest first", body = Vec<EventResponse>),
        (status = 404, description = "Batch not found (BATCH_NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_batch_events(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.ledger.list_batch_events(id).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// Latest events across every batch.
#[utoipa::path(
    get,
    path = "/events",
    tag = "Batches",
    operation_id = "listEvents",
    summary = "List recent events",
    description = "Newest first. `limit` is clamped to 1-200 and defaults to 10.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Recent events", body = Vec<EventResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 200);
    let events = state.ledger.list_events(limit).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}
