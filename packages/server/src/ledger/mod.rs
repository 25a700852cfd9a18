//! Event-sourced batch lifecycle.
//!
//! Every quantity change appends a `batch_event` row and updates the cached
//! `batch.quantity` in the same transaction. Replaying a batch's events from
//! zero always reproduces the cached value; each mutation re-checks this
//! before committing.

mod error;
mod locks;
mod types;

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use common::quantity::{self, EPSILON};
use common::{BatchStatus, EventType, StorageLocation};
use sea_orm::sea_query::{Expr, Func, LikeExpr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

pub use error::LedgerError;
pub use locks::BatchLocks;
pub use types::{BatchFilter, BatchPatch, BatchSource, ItemRef, NewBatch};

use crate::catalog::{self, NewItem};
use crate::entity::{batch, batch_event, item};
use crate::models::shared::escape_like;
use crate::utils::clock::today;

/// Category given to items created on the fly from a batch.
pub const UNCATEGORIZED: &str = "uncategorized";
/// Unit given to such items when the batch names none.
pub const FALLBACK_UNIT: &str = "unit";

#[derive(Clone)]
pub struct Ledger {
    db: DatabaseConnection,
    locks: Arc<BatchLocks>,
    default_shelf_life_days: i32,
}

impl Ledger {
    pub fn new(db: DatabaseConnection, default_shelf_life_days: i32) -> Self {
        Self {
            db,
            locks: Arc::new(BatchLocks::new()),
            default_shelf_life_days,
        }
    }

    /// Create one `in_stock` batch and its `created` event.
    pub async fn create_batch(
        &self,
        spec: NewBatch,
        source: BatchSource,
    ) -> Result<batch::Model, LedgerError> {
        check_quantity(spec.quantity)?;

        let today = today();
        let txn = self.db.begin().await?;
        let batch = self.insert_batch(&txn, &spec, &source, today).await?;
        txn.commit().await?;

        info!(
            batch_id = batch.id,
            item = %batch.item_name_snapshot,
            quantity = batch.quantity,
            source = %source.note(),
            "Batch created"
        );
        Ok(batch)
    }

    /// Create several batches atomically. Either every batch and event is
    /// written or none is.
    pub async fn bulk_create_batches(
        &self,
        source: BatchSource,
        specs: Vec<NewBatch>,
    ) -> Result<Vec<batch::Model>, LedgerError> {
        if specs.is_empty() {
            return Err(LedgerError::Validation(
                "At least one batch is required".into(),
            ));
        }
        for (idx, spec) in specs.iter().enumerate() {
            check_quantity(spec.quantity).map_err(|e| match e {
                LedgerError::InvalidQuantity(msg) => {
                    LedgerError::InvalidQuantity(format!("batch #{idx}: {msg}"))
                }
                other => other,
            })?;
        }

        let today = today();
        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(specs.len());
        for spec in &specs {
            created.push(self.insert_batch(&txn, spec, &source, today).await?);
        }
        txn.commit().await?;

        info!(
            count = created.len(),
            source = %source.note(),
            "Bulk batch creation committed"
        );
        Ok(created)
    }

    pub async fn consume_batch(
        &self,
        batch_id: i32,
        quantity: f64,
        note: Option<String>,
    ) -> Result<batch::Model, LedgerError> {
        self.apply_outflow(batch_id, quantity, EventType::Consumed, note)
            .await
    }

    pub async fn discard_batch(
        &self,
        batch_id: i32,
        quantity: f64,
        reason: Option<String>,
    ) -> Result<batch::Model, LedgerError> {
        self.apply_outflow(batch_id, quantity, EventType::Discarded, reason)
            .await
    }

    /// Change quantity, expiry date or location of an in-stock batch.
    ///
    /// A quantity change is recorded as an `adjusted` event carrying
    /// `new - old`. Lowering stock to zero must go through consume/discard.
    pub async fn update_batch(
        &self,
        batch_id: i32,
        patch: BatchPatch,
    ) -> Result<batch::Model, LedgerError> {
        if patch.is_empty() {
            return Err(LedgerError::Validation(
                "Patch must set at least one of quantity, expire_date, location".into(),
            ));
        }
        if let Some(q) = patch.quantity {
            check_quantity(q)?;
        }

        let _guard = self.locks.acquire(batch_id).await;
        let txn = self.db.begin().await?;
        let current = find_batch_for_update(&txn, batch_id).await?;
        ensure_in_stock(&current)?;

        let now = Utc::now();
        let old_quantity = current.quantity;
        let mut active: batch::ActiveModel = current.into();

        if let Some(new_quantity) = patch.quantity {
            if let Some(step) = plan_adjust(old_quantity, new_quantity)? {
                append_event(
                    &txn,
                    batch_id,
                    EventType::Adjusted,
                    step.delta,
                    format!("adjusted from {old_quantity} to {new_quantity}"),
                )
                .await?;
                active.quantity = Set(step.quantity);
            }
        }
        if let Some(date) = patch.expire_date {
            active.expire_date = Set(date);
        }
        if let Some(location) = patch.location {
            active.location = Set(location);
        }
        active.updated_at = Set(now);

        let updated = active.update(&txn).await?;
        verify_projection(&txn, &updated).await?;
        txn.commit().await?;

        info!(
            batch_id,
            old_quantity,
            new_quantity = updated.quantity,
            expire_date = %updated.expire_date,
            location = %updated.location,
            "Batch updated"
        );
        Ok(updated)
    }

    pub async fn get_batch(&self, batch_id: i32) -> Result<batch::Model, LedgerError> {
        find_batch(&self.db, batch_id).await
    }

    /// Filtered, paginated batch listing, newest first. Returns the page and
    /// the total number of matches.
    pub async fn list_batches(
        &self,
        filter: &BatchFilter,
    ) -> Result<(Vec<batch::Model>, u64), LedgerError> {
        let mut select = batch::Entity::find();

        if let Some(location) = filter.location {
            select = select.filter(batch::Column::Location.eq(location));
        }
        if let Some(status) = filter.status {
            select = select.filter(batch::Column::Status.eq(status));
        }
        if let Some(ref keyword) = filter.keyword {
            let term = escape_like(keyword.trim());
            if !term.is_empty() {
                let name = Expr::expr(Func::lower(Expr::col(batch::Column::ItemNameSnapshot)));
                let pattern = LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\');
                select = select.filter(sea_orm::sea_query::ExprTrait::like(name, pattern));
            }
        }

        let per_page = filter.per_page.max(1);
        let page = filter.page.max(1);
        let total = select.clone().paginate(&self.db, per_page).num_items().await?;

        let data = select
            .order_by_desc(batch::Column::CreatedAt)
            .order_by_desc(batch::Column::Id)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(&self.db)
            .await?;

        Ok((data, total))
    }

    /// Events of one batch in replay order.
    pub async fn list_batch_events(
        &self,
        batch_id: i32,
    ) -> Result<Vec<batch_event::Model>, LedgerError> {
        find_batch(&self.db, batch_id).await?;
        Ok(events_for_batch(&self.db, batch_id).await?)
    }

    /// Most recent events across all batches, newest first.
    pub async fn list_events(&self, limit: u64) -> Result<Vec<batch_event::Model>, LedgerError> {
        Ok(batch_event::Entity::find()
            .order_by_desc(batch_event::Column::CreatedAt)
            .order_by_desc(batch_event::Column::Id)
            .limit(Some(limit))
            .all(&self.db)
            .await?)
    }

    async fn apply_outflow(
        &self,
        batch_id: i32,
        quantity: f64,
        kind: EventType,
        note: Option<String>,
    ) -> Result<batch::Model, LedgerError> {
        check_quantity(quantity)?;

        let _guard = self.locks.acquire(batch_id).await;
        let txn = self.db.begin().await?;
        let current = find_batch_for_update(&txn, batch_id).await?;
        ensure_in_stock(&current)?;

        let step = plan_outflow(current.quantity, quantity, kind)?;
        let before = current.quantity;

        append_event(&txn, batch_id, kind, step.delta, note.unwrap_or_default()).await?;

        let mut active: batch::ActiveModel = current.into();
        active.quantity = Set(step.remaining);
        active.status = Set(step.status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        verify_projection(&txn, &updated).await?;
        txn.commit().await?;

        if updated.status.is_terminal() {
            self.locks.forget(batch_id);
        }

        info!(
            batch_id,
            event = %kind,
            requested = quantity,
            before,
            remaining = updated.quantity,
            status = %updated.status,
            "Batch outflow recorded"
        );
        Ok(updated)
    }

    async fn insert_batch(
        &self,
        txn: &DatabaseTransaction,
        spec: &NewBatch,
        source: &BatchSource,
        today: NaiveDate,
    ) -> Result<batch::Model, LedgerError> {
        let unit_hint = spec
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let item = self.resolve_item(txn, &spec.item, unit_hint).await?;

        let unit = unit_hint.unwrap_or(&item.default_unit).to_string();
        let expire_date = match spec.expire_date {
            Some(date) => date,
            None => default_expire_date(
                today,
                item.shelf_life_days_default
                    .unwrap_or(self.default_shelf_life_days),
            ),
        };

        let now = Utc::now();
        let created = batch::ActiveModel {
            item_id: Set(item.id),
            item_name_snapshot: Set(item.name.clone()),
            quantity: Set(spec.quantity),
            unit: Set(unit),
            expire_date: Set(expire_date),
            location: Set(spec.location.unwrap_or(StorageLocation::Fridge)),
            status: Set(BatchStatus::InStock),
            source_type: Set(source.source_type()),
            source_ref: Set(source.source_ref()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        append_event(
            txn,
            created.id,
            EventType::Created,
            spec.quantity,
            source.note(),
        )
        .await?;
        verify_projection(txn, &created).await?;

        Ok(created)
    }

    async fn resolve_item(
        &self,
        txn: &DatabaseTransaction,
        item_ref: &ItemRef,
        unit_hint: Option<&str>,
    ) -> Result<item::Model, LedgerError> {
        match item_ref {
            ItemRef::Id(id) => item::Entity::find_by_id(*id)
                .one(txn)
                .await?
                .ok_or_else(|| LedgerError::ItemNotFound(id.to_string())),
            ItemRef::Name(raw) => {
                let name = raw.trim();
                if name.is_empty() {
                    return Err(LedgerError::Validation(
                        "Item name must not be empty".into(),
                    ));
                }
                if let Some(found) = catalog::find_item_by_name(txn, name).await? {
                    return Ok(found);
                }

                let new_item = NewItem {
                    name: name.to_string(),
                    category: UNCATEGORIZED.to_string(),
                    default_unit: unit_hint.unwrap_or(FALLBACK_UNIT).to_string(),
                    shelf_life_days_default: Some(self.default_shelf_life_days),
                };
                catalog::insert_item_if_absent(txn, &new_item).await?;
                info!(item = name, "Item created on first use");

                catalog::find_item_by_name(txn, name)
                    .await?
                    .ok_or_else(|| LedgerError::ItemNotFound(name.to_string()))
            }
        }
    }
}

/// Result of applying a consume/discard to a batch holding some quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outflow {
    pub delta: f64,
    pub remaining: f64,
    pub status: BatchStatus,
}

/// Work out the event delta and resulting state for an outflow.
///
/// Taking everything (within [`EPSILON`]) empties the batch exactly and moves
/// it to the terminal status of `kind`; the delta then equals the full
/// cached quantity so the log sums to exactly zero.
pub fn plan_outflow(
    current: f64,
    requested: f64,
    kind: EventType,
) -> Result<Outflow, LedgerError> {
    if !quantity::covers(current, requested) {
        return Err(LedgerError::InvalidQuantity(format!(
            "requested {requested} exceeds remaining {current}"
        )));
    }

    let remaining = current - requested;
    if quantity::is_zero(remaining) {
        let status = kind.terminal_status().unwrap_or(BatchStatus::InStock);
        return Ok(Outflow {
            delta: -current,
            remaining: 0.0,
            status,
        });
    }

    Ok(Outflow {
        delta: -requested,
        remaining,
        status: BatchStatus::InStock,
    })
}

/// An `adjusted` event and the quantity to cache after it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adjustment {
    pub delta: f64,
    /// `current + delta`, which is what replaying the log yields. It can
    /// differ from the requested quantity in the last bits.
    pub quantity: f64,
}

/// Plan a quantity adjustment. `None` when nothing changes.
pub fn plan_adjust(current: f64, requested: f64) -> Result<Option<Adjustment>, LedgerError> {
    let delta = requested - current;
    if quantity::is_zero(delta) {
        return Ok(None);
    }

    let cached = current + delta;
    if cached <= 0.0 || quantity::is_zero(cached) {
        return Err(LedgerError::InvalidQuantity(format!(
            "adjusting {current} to {requested} leaves no stock"
        )));
    }
    Ok(Some(Adjustment {
        delta,
        quantity: cached,
    }))
}

/// Quantities entering the ledger must be finite and strictly positive.
pub fn check_quantity(value: f64) -> Result<(), LedgerError> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidQuantity(format!(
            "{value} is not a finite number"
        )));
    }
    if value <= 0.0 {
        return Err(LedgerError::InvalidQuantity(format!(
            "{value} must be greater than zero"
        )));
    }
    Ok(())
}

pub fn default_expire_date(today: NaiveDate, shelf_life_days: i32) -> NaiveDate {
    let days = Days::new(shelf_life_days.max(0) as u64);
    today.checked_add_days(days).unwrap_or(NaiveDate::MAX)
}

fn ensure_in_stock(batch: &batch::Model) -> Result<(), LedgerError> {
    if batch.status.is_terminal() {
        return Err(LedgerError::BatchTerminal {
            batch_id: batch.id,
            status: batch.status,
        });
    }
    Ok(())
}

async fn find_batch<C: ConnectionTrait>(db: &C, id: i32) -> Result<batch::Model, LedgerError> {
    batch::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(LedgerError::BatchNotFound(id))
}

async fn find_batch_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<batch::Model, LedgerError> {
    batch::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(LedgerError::BatchNotFound(id))
}

async fn events_for_batch<C: ConnectionTrait>(
    db: &C,
    batch_id: i32,
) -> Result<Vec<batch_event::Model>, sea_orm::DbErr> {
    batch_event::Entity::find()
        .filter(batch_event::Column::BatchId.eq(batch_id))
        .order_by_asc(batch_event::Column::CreatedAt)
        .order_by_asc(batch_event::Column::Id)
        .all(db)
        .await
}

async fn append_event<C: ConnectionTrait>(
    db: &C,
    batch_id: i32,
    event_type: EventType,
    delta_quantity: f64,
    note: String,
) -> Result<batch_event::Model, sea_orm::DbErr> {
    batch_event::ActiveModel {
        batch_id: Set(batch_id),
        event_type: Set(event_type),
        delta_quantity: Set(delta_quantity),
        note: Set(note),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Replay the batch's events and compare against its cached quantity.
async fn verify_projection<C: ConnectionTrait>(
    db: &C,
    batch: &batch::Model,
) -> Result<(), LedgerError> {
    let events = events_for_batch(db, batch.id).await?;
    let replayed = quantity::replay(events.iter().map(|e| e.delta_quantity));
    if (replayed - batch.quantity).abs() > EPSILON {
        tracing::error!(
            batch_id = batch.id,
            cached = batch.quantity,
            replayed,
            "Batch projection diverged from event log"
        );
        return Err(LedgerError::ProjectionDiverged {
            batch_id: batch.id,
            cached: batch.quantity,
            replayed,
        });
    }
    Ok(())
}
