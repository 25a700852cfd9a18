//! Which recipes the current stock can make, and what is missing.
//!
//! Units are compared as stored; ingredient and batch units are assumed to
//! already agree.

use std::collections::HashMap;

use common::BatchStatus;
use common::quantity;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};

use crate::catalog;
use crate::entity::{batch, recipe};

/// One ingredient line checked against stock.
#[derive(Clone, Debug, PartialEq)]
pub struct IngredientCheck {
    pub item_id: i32,
    pub item_name: String,
    pub required: f64,
    pub unit: String,
    pub available: f64,
    pub shortfall: f64,
}

#[derive(Clone, Debug)]
pub struct RecipeAvailability {
    pub recipe: recipe::Model,
    pub ingredients: Vec<IngredientCheck>,
    pub feasible: bool,
}

/// Amount still needed, or zero when stock covers the requirement.
pub fn shortfall(required: f64, available: f64) -> f64 {
    if quantity::covers(available, required) {
        0.0
    } else {
        required - available
    }
}

/// Sum quantities per item.
pub fn stock_totals<I>(rows: I) -> HashMap<i32, f64>
where
    I: IntoIterator<Item = (i32, f64)>,
{
    let mut totals = HashMap::new();
    for (item_id, qty) in rows {
        *totals.entry(item_id).or_insert(0.0) += qty;
    }
    totals
}

/// True when every `(item_id, required)` pair is covered by `stock`.
/// An empty requirement list is trivially satisfied.
pub fn is_feasible(requirements: &[(i32, f64)], stock: &HashMap<i32, f64>) -> bool {
    requirements.iter().all(|&(item_id, required)| {
        quantity::covers(stock.get(&item_id).copied().unwrap_or(0.0), required)
    })
}

/// In-stock quantity per item id.
pub async fn in_stock_totals<C: ConnectionTrait>(db: &C) -> Result<HashMap<i32, f64>, DbErr> {
    let rows: Vec<(i32, f64)> = batch::Entity::find()
        .select_only()
        .column(batch::Column::ItemId)
        .column(batch::Column::Quantity)
        .filter(batch::Column::Status.eq(BatchStatus::InStock))
        .into_tuple()
        .all(db)
        .await?;
    Ok(stock_totals(rows))
}

/// Every recipe in stored order with per-ingredient availability.
pub async fn recipe_availability<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<RecipeAvailability>, DbErr> {
    let recipes = catalog::list_recipes(db).await?;
    let ingredients = catalog::list_recipe_ingredients(db).await?;
    let names: HashMap<i32, String> = catalog::list_items(db)
        .await?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect();
    let stock = in_stock_totals(db).await?;

    let mut by_recipe: HashMap<i32, Vec<IngredientCheck>> = HashMap::new();
    for ing in ingredients {
        let available = stock.get(&ing.item_id).copied().unwrap_or(0.0);
        by_recipe
            .entry(ing.recipe_id)
            .or_default()
            .push(IngredientCheck {
                item_id: ing.item_id,
                item_name: names.get(&ing.item_id).cloned().unwrap_or_default(),
                required: ing.quantity,
                unit: ing.unit,
                available,
                shortfall: shortfall(ing.quantity, available),
            });
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| {
            let ingredients = by_recipe.remove(&recipe.id).unwrap_or_default();
            let requirements: Vec<(i32, f64)> =
                ingredients.iter().map(|c| (c.item_id, c.required)).collect();
            let feasible = is_feasible(&requirements, &stock);
            RecipeAvailability {
                recipe,
                ingredients,
                feasible,
            }
        })
        .collect())
}

/// Names of the recipes that can be made right now, in stored order.
pub async fn feasible_recipes<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbErr> {
    Ok(recipe_availability(db)
        .await?
        .into_iter()
        .filter(|r| r.feasible)
        .map(|r| r.recipe.name)
        .collect())
}
