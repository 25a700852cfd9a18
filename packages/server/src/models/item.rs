use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::item;

#[derive(Serialize, ToSchema)]
pub struct ItemResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "鸡蛋")]
    pub name: String,
    #[schema(example = "protein")]
    pub category: String,
    #[schema(example = "pcs")]
    pub default_unit: String,
    #[schema(example = 10)]
    pub shelf_life_days_default: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<item::Model> for ItemResponse {
    fn from(i: item::Model) -> Self {
        Self {
            id: i.id,
            name: i.name,
            category: i.category,
            default_unit: i.default_unit,
            shelf_life_days_default: i.shelf_life_days_default,
            created_at: i.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateItemRequest {
    #[schema(example = "豆腐")]
    pub name: String,
    /// Defaults to `uncategorized`.
    #[schema(example = "protein")]
    pub category: Option<String>,
    /// Defaults to `unit`.
    #[schema(example = "g")]
    pub default_unit: Option<String>,
    #[schema(example = 3)]
    pub shelf_life_days_default: Option<i32>,
}
