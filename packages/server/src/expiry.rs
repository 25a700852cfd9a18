//! Expiry ranking and dashboard counters.

use chrono::{Duration, NaiveDate};
use common::BatchStatus;
use sea_orm::{
    AccessMode, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};

use crate::entity::batch;
use crate::recipes;
use crate::utils::clock::days_until;

/// Horizons outside this range are rejected at the API boundary.
pub const MAX_HORIZON_DAYS: i64 = 3650;

#[derive(Clone, Debug)]
pub struct ExpiringBatch {
    pub batch: batch::Model,
    pub days_left: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardSummary {
    pub horizon_days: i64,
    pub expiring_count: u64,
    pub in_stock_count: u64,
    pub feasible_recipe_count: u64,
}

/// Keep in-stock batches due within `horizon_days` of `today`, most urgent
/// first, ties broken by batch id.
pub fn rank_expiring(
    batches: Vec<batch::Model>,
    horizon_days: i64,
    today: NaiveDate,
) -> Vec<ExpiringBatch> {
    let mut ranked: Vec<ExpiringBatch> = batches
        .into_iter()
        .filter(|b| b.status == BatchStatus::InStock)
        .map(|b| ExpiringBatch {
            days_left: days_until(b.expire_date, today),
            batch: b,
        })
        .filter(|e| e.days_left <= horizon_days)
        .collect();
    ranked.sort_by_key(|e| (e.days_left, e.batch.id));
    ranked
}

/// In-stock batches with `expire_date - today <= horizon_days`, including
/// already expired ones. `days_left` is computed against `today` on every
/// call.
pub async fn list_expiring<C: ConnectionTrait>(
    db: &C,
    horizon_days: i64,
    today: NaiveDate,
) -> Result<Vec<ExpiringBatch>, DbErr> {
    let mut select = batch::Entity::find().filter(batch::Column::Status.eq(BatchStatus::InStock));
    if let Some(cutoff) = today.checked_add_signed(Duration::days(horizon_days)) {
        select = select.filter(batch::Column::ExpireDate.lte(cutoff));
    }

    let candidates = select
        .order_by_asc(batch::Column::ExpireDate)
        .order_by_asc(batch::Column::Id)
        .all(db)
        .await?;

    Ok(rank_expiring(candidates, horizon_days, today))
}

/// The three dashboard counters, read from one transaction so they describe
/// the same state.
pub async fn dashboard_summary(
    db: &DatabaseConnection,
    horizon_days: i64,
    today: NaiveDate,
) -> Result<DashboardSummary, DbErr> {
    let txn = match db.get_database_backend() {
        DbBackend::Postgres => {
            db.begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?
        }
        _ => db.begin().await?,
    };

    let expiring_count = list_expiring(&txn, horizon_days, today).await?.len() as u64;
    let in_stock_count = batch::Entity::find()
        .filter(batch::Column::Status.eq(BatchStatus::InStock))
        .count(&txn)
        .await?;
    let feasible_recipe_count = recipes::feasible_recipes(&txn).await?.len() as u64;

    txn.commit().await?;

    Ok(DashboardSummary {
        horizon_days,
        expiring_count,
        in_stock_count,
        feasible_recipe_count,
    })
}
