use chrono::{DateTime, NaiveDate, Utc};
use common::{BatchStatus, EventType, SourceType, StorageLocation};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::{batch, batch_event};
use crate::error::AppError;
use crate::expiry::ExpiringBatch;
use crate::ledger::{BatchPatch, ItemRef, NewBatch};
use crate::models::shared::Pagination;

#[derive(Serialize, ToSchema)]
pub struct BatchResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub item_id: i32,
    /// Item name when the batch was created.
    #[schema(example = "鸡蛋")]
    pub item_name: String,
    #[schema(example = 7.0)]
    pub quantity: f64,
    #[schema(example = "pcs")]
    pub unit: String,
    #[schema(example = "2026-03-03")]
    pub expire_date: NaiveDate,
    pub location: StorageLocation,
    pub status: BatchStatus,
    pub source_type: SourceType,
    /// Image id for image-sourced batches.
    pub source_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<batch::Model> for BatchResponse {
    fn from(b: batch::Model) -> Self {
        Self {
            id: b.id,
            item_id: b.item_id,
            item_name: b.item_name_snapshot,
            quantity: b.quantity,
            unit: b.unit,
            expire_date: b.expire_date,
            location: b.location,
            status: b.status,
            source_type: b.source_type,
            source_ref: b.source_ref,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// One batch to create. Name the item by `item_id` or `item_name`; an
/// unknown name creates the item.
#[derive(Deserialize, ToSchema)]
pub struct CreateBatchRequest {
    #[schema(example = 1)]
    pub item_id: Option<i32>,
    #[schema(example = "鸡蛋")]
    pub item_name: Option<String>,
    /// Must be greater than zero.
    #[schema(example = 12.0)]
    pub quantity: f64,
    /// Defaults to the item's unit.
    #[schema(example = "pcs")]
    pub unit: Option<String>,
    /// Defaults to today plus the item's shelf life.
    #[schema(example = "2026-03-08")]
    pub expire_date: Option<NaiveDate>,
    /// Defaults to `fridge`.
    pub location: Option<StorageLocation>,
}

impl CreateBatchRequest {
    pub fn into_new_batch(self) -> Result<NewBatch, AppError> {
        let item = match (self.item_id, self.item_name) {
            (Some(id), _) => ItemRef::Id(id),
            (None, Some(name)) if !name.trim().is_empty() => ItemRef::Name(name),
            _ => {
                return Err(AppError::Validation(
                    "Either item_id or item_name is required".into(),
                ));
            }
        };
        Ok(NewBatch {
            item,
            quantity: self.quantity,
            unit: self.unit,
            expire_date: self.expire_date,
            location: self.location,
        })
    }
}

/// Accepted detections (or manual entries) to store in one go.
#[derive(Deserialize, ToSchema)]
pub struct BulkCreateBatchesRequest {
    /// Uploaded image the batches came from. Omit for manual entry.
    pub image_id: Option<String>,
    pub batches: Vec<CreateBatchRequest>,
}

#[derive(Serialize, ToSchema)]
pub struct BulkCreateBatchesResponse {
    pub data: Vec<BatchResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBatchRequest {
    /// New quantity. Recorded as an `adjusted` event.
    #[schema(example = 10.0)]
    pub quantity: Option<f64>,
    pub expire_date: Option<NaiveDate>,
    pub location: Option<StorageLocation>,
}

impl From<UpdateBatchRequest> for BatchPatch {
    fn from(req: UpdateBatchRequest) -> Self {
        Self {
            quantity: req.quantity,
            expire_date: req.expire_date,
            location: req.location,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ConsumeBatchRequest {
    #[schema(example = 5.0)]
    pub quantity: f64,
    #[schema(example = "breakfast")]
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DiscardBatchRequest {
    #[schema(example = 2.0)]
    pub quantity: f64,
    #[schema(example = "spoiled")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchListQuery {
    /// `fridge`, `freezer` or `pantry`.
    pub location: Option<String>,
    /// `in_stock`, `consumed` or `discarded`.
    pub status: Option<String>,
    /// Case-insensitive substring of the item name.
    pub keyword: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct BatchListResponse {
    pub data: Vec<BatchResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpiringQuery {
    /// Horizon in days. Defaults to the configured horizon.
    pub days: Option<i64>,
    /// Return only the first N entries.
    pub limit: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct ExpiringBatchResponse {
    #[serde(flatten)]
    pub batch: BatchResponse,
    /// Days until expiry; negative once expired.
    #[schema(example = 2)]
    pub days_left: i64,
}

impl From<ExpiringBatch> for ExpiringBatchResponse {
    fn from(e: ExpiringBatch) -> Self {
        Self {
            batch: e.batch.into(),
            days_left: e.days_left,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ExpiringListResponse {
    pub horizon_days: i64,
    pub data: Vec<ExpiringBatchResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub batch_id: i32,
    pub event_type: EventType,
    /// Signed change applied to the batch quantity.
    #[schema(example = -5.0)]
    pub delta_quantity: f64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl From<batch_event::Model> for EventResponse {
    fn from(e: batch_event::Model) -> Self {
        Self {
            id: e.id,
            batch_id: e.batch_id,
            event_type: e.event_type,
            delta_quantity: e.delta_quantity,
            note: e.note,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// 1-200, default 10.
    pub limit: Option<u64>,
}
