use common::EventType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only. Rows are never updated or deleted.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub batch_id: i32,

    #[sea_orm(belongs_to, from = "batch_id", to = "id")]
    pub batch: HasOne<super::batch::Entity>,

    pub event_type: EventType,

    /// Signed change applied to the batch quantity.
    pub delta_quantity: f64,

    #[sea_orm(column_type = "Text")]
    pub note: String,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
