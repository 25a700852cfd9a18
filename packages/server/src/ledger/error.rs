use common::BatchStatus;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Batch {batch_id} is {status} and can no longer change")]
    BatchTerminal { batch_id: i32, status: BatchStatus },

    #[error("Item {0} not found")]
    ItemNotFound(String),

    #[error("Batch {0} not found")]
    BatchNotFound(i32),

    #[error("{0}")]
    Validation(String),

    /// The cached quantity no longer matches the event log.
    #[error("Batch {batch_id} holds {cached} but its events sum to {replayed}")]
    ProjectionDiverged {
        batch_id: i32,
        cached: f64,
        replayed: f64,
    },

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}
