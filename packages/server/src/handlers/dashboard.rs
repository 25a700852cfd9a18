use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::AppError;
use crate::expiry;
use crate::models::dashboard::DashboardSummaryResponse;
use crate::state::AppState;
use crate::utils::clock::today;

#[utoipa::path(
    get,
    path = "/dashboard/summary",
    tag = "Dashboard",
    operation_id = "getDashboardSummary",
    summary = "Inventory counters",
    description = "Expiring batches within the configured horizon, in-stock batches, and feasible recipes, read from one transaction.",
    responses(
        (status = 200, description = "Counters", body = DashboardSummaryResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummaryResponse>, AppError> {
    let summary = expiry::dashboard_summary(
        &state.db,
        state.config.inventory.expiring_horizon_days,
        today(),
    )
    .await?;
    Ok(Json(summary.into()))
}
