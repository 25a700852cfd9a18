use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::inventory::StorageLocation;

/// A candidate batch proposed by a vision provider.
///
/// Detections are never persisted. The caller reviews them, edits what it
/// needs, and turns the accepted ones into batch specs for bulk ingestion.
/// Every provider yields this exact shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Detection {
    /// Stable identifier within one detection result.
    #[schema(example = "det_1_9275128374001")]
    pub temp_id: String,
    /// Catalog item, when the name resolved to one.
    #[schema(example = 1)]
    pub item_id: Option<i32>,
    /// Canonical item name when resolved, otherwise the raw provider label.
    #[schema(example = "鸡蛋")]
    pub item_name: String,
    /// Provider confidence in `[0, 1]`.
    #[schema(example = 0.87)]
    pub confidence: f64,
    #[schema(example = 2.5)]
    pub quantity: f64,
    #[schema(example = "pcs")]
    pub unit: String,
    /// Suggested expiry, unset when the provider gave nothing usable.
    #[schema(example = "2026-10-29")]
    pub suggest_expire_date: Option<NaiveDate>,
    pub location: StorageLocation,
}
