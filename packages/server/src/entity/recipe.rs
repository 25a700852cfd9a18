use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    /// Comma-separated, e.g. "rice,quick".
    pub tags: String,
    /// Comma-separated, e.g. "egg".
    pub allergens: String,

    #[sea_orm(column_type = "Text")]
    pub steps: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub nutrition: Json,

    #[sea_orm(has_many)]
    pub ingredients: HasMany<super::recipe_ingredient::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
