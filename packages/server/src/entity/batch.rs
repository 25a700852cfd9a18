use common::{BatchStatus, SourceType, StorageLocation};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub item_id: i32,

    #[sea_orm(belongs_to, from = "item_id", to = "id")]
    pub item: HasOne<super::item::Entity>,

    /// Item name at creation time. Kept even if the item is renamed.
    pub item_name_snapshot: String,

    /// Cached projection of the event log.
    pub quantity: f64,

    pub unit: String,

    #[sea_orm(indexed)]
    pub expire_date: Date,

    pub location: StorageLocation,

    #[sea_orm(indexed)]
    pub status: BatchStatus,

    pub source_type: SourceType,

    /// Image id for image-sourced batches.
    pub source_ref: Option<String>,

    #[sea_orm(has_many)]
    pub events: HasMany<super::batch_event::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
