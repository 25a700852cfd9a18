use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised while resolving or running a vision provider.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Provider '{0}' is not registered")]
    ProviderNotFound(String),

    #[error("Provider '{provider}' is unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("Image {0} not found")]
    ImageNotFound(String),

    #[error("Vision request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Vision endpoint answered with HTTP {status}")]
    Upstream { status: u16 },

    #[error("Vision request failed: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}
