use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An uploaded photo. The bytes live in the blob store under `content_hash`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub content_hash: String,

    /// Original upload filename.
    pub filename: String,

    pub content_type: Option<String>,

    pub size: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
