//! Reference data: items, recipes and their ingredients.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entity::{batch, batch_event, image, item, recipe, recipe_ingredient};

#[derive(Clone, Debug)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub default_unit: String,
    pub shelf_life_days_default: Option<i32>,
}

/// Tables that can be counted through [`count_rows`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountedEntity {
    Item,
    Batch,
    BatchEvent,
    Recipe,
    RecipeIngredient,
    Image,
}

pub async fn find_item_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<item::Model>, DbErr> {
    item::Entity::find()
        .filter(item::Column::Name.eq(name))
        .one(db)
        .await
}

/// Insert an item unless one with the same name exists. Returns whether a
/// row was written.
pub async fn insert_item_if_absent<C: ConnectionTrait>(
    db: &C,
    new_item: &NewItem,
) -> Result<bool, DbErr> {
    let model = item::ActiveModel {
        name: Set(new_item.name.clone()),
        category: Set(new_item.category.clone()),
        default_unit: Set(new_item.default_unit.clone()),
        shelf_life_days_default: Set(new_item.shelf_life_days_default),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = item::Entity::insert(model)
        .on_conflict(
            OnConflict::column(item::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(rows) => Ok(rows > 0),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create an item. `None` when the name is taken.
pub async fn create_item<C: ConnectionTrait>(
    db: &C,
    new_item: &NewItem,
) -> Result<Option<item::Model>, DbErr> {
    if !insert_item_if_absent(db, new_item).await? {
        return Ok(None);
    }
    find_item_by_name(db, &new_item.name).await
}

/// All items ordered by id.
pub async fn list_items<C: ConnectionTrait>(db: &C) -> Result<Vec<item::Model>, DbErr> {
    item::Entity::find()
        .order_by_asc(item::Column::Id)
        .all(db)
        .await
}

/// All recipes in insertion order.
pub async fn list_recipes<C: ConnectionTrait>(db: &C) -> Result<Vec<recipe::Model>, DbErr> {
    recipe::Entity::find()
        .order_by_asc(recipe::Column::Id)
        .all(db)
        .await
}

/// Every ingredient row, grouped by recipe and ordered by position.
pub async fn list_recipe_ingredients<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<recipe_ingredient::Model>, DbErr> {
    recipe_ingredient::Entity::find()
        .order_by_asc(recipe_ingredient::Column::RecipeId)
        .order_by_asc(recipe_ingredient::Column::Position)
        .order_by_asc(recipe_ingredient::Column::Id)
        .all(db)
        .await
}

pub async fn count_rows<C: ConnectionTrait>(db: &C, entity: CountedEntity) -> Result<u64, DbErr> {
    match entity {
        CountedEntity::Item => item::Entity::find().count(db).await,
        CountedEntity::Batch => batch::Entity::find().count(db).await,
        CountedEntity::BatchEvent => batch_event::Entity::find().count(db).await,
        CountedEntity::Recipe => recipe::Entity::find().count(db).await,
        CountedEntity::RecipeIngredient => recipe_ingredient::Entity::find().count(db).await,
        CountedEntity::Image => image::Entity::find().count(db).await,
    }
}
