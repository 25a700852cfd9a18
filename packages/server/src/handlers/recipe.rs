use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::AppError;
use crate::models::recipe::*;
use crate::recipes;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List recipes with availability",
    description = "Every recipe in stored order. Each ingredient carries the in-stock quantity of its item and the shortfall, if any.",
    responses(
        (status = 200, description = "Recipes", body = RecipeListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let recipes = recipes::recipe_availability(&state.db).await?;
    Ok(Json(RecipeListResponse {
        data: recipes.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/recipes/feasible",
    tag = "Recipes",
    operation_id = "listFeasibleRecipes",
    summary = "Names of recipes makeable from current stock",
    responses(
        (status = 200, description = "Feasible recipe names", body = FeasibleRecipesResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_feasible_recipes(
    State(state): State<AppState>,
) -> Result<Json<FeasibleRecipesResponse>, AppError> {
    let names = recipes::feasible_recipes(&state.db).await?;
    Ok(Json(FeasibleRecipesResponse {
        count: names.len(),
        data: names,
    }))
}
