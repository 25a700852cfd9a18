use serde::Serialize;
use utoipa::ToSchema;

use crate::recipes::{IngredientCheck, RecipeAvailability};

#[derive(Serialize, ToSchema)]
pub struct IngredientResponse {
    pub item_id: i32,
    #[schema(example = "鸡蛋")]
    pub item_name: String,
    #[schema(example = 2.0)]
    pub quantity: f64,
    #[schema(example = "pcs")]
    pub unit: String,
    /// Total in-stock quantity of the item.
    pub available: f64,
    /// Amount still missing; zero when covered.
    pub shortfall: f64,
}

impl From<IngredientCheck> for IngredientResponse {
    fn from(c: IngredientCheck) -> Self {
        Self {
            item_id: c.item_id,
            item_name: c.item_name,
            quantity: c.required,
            unit: c.unit,
            available: c.available,
            shortfall: c.shortfall,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    #[schema(example = "番茄炒蛋")]
    pub name: String,
    pub tags: Vec<String>,
    pub allergens: Vec<String>,
    pub steps: String,
    /// Free-form nutrition facts, e.g. `{"calories": 320}`.
    #[schema(value_type = Object)]
    pub nutrition: serde_json::Value,
    pub feasible: bool,
    pub ingredients: Vec<IngredientResponse>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl From<RecipeAvailability> for RecipeResponse {
    fn from(r: RecipeAvailability) -> Self {
        Self {
            id: r.recipe.id,
            tags: split_list(&r.recipe.tags),
            allergens: split_list(&r.recipe.allergens),
            name: r.recipe.name,
            steps: r.recipe.steps,
            nutrition: r.recipe.nutrition,
            feasible: r.feasible,
            ingredients: r.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RecipeListResponse {
    pub data: Vec<RecipeResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct FeasibleRecipesResponse {
    /// Recipe names in stored order.
    pub data: Vec<String>,
    pub count: usize,
}
