use serde::Serialize;
use utoipa::ToSchema;

use crate::expiry::DashboardSummary;

#[derive(Serialize, ToSchema)]
pub struct DashboardSummaryResponse {
    /// Horizon used for `expiring_count`.
    #[schema(example = 3)]
    pub horizon_days: i64,
    #[schema(example = 4)]
    pub expiring_count: u64,
    #[schema(example = 17)]
    pub in_stock_count: u64,
    #[schema(example = 2)]
    pub feasible_recipe_count: u64,
}

impl From<DashboardSummary> for DashboardSummaryResponse {
    fn from(s: DashboardSummary) -> Self {
        Self {
            horizon_days: s.horizon_days,
            expiring_count: s.expiring_count,
            in_stock_count: s.in_stock_count,
            feasible_recipe_count: s.feasible_recipe_count,
        }
    }
}
