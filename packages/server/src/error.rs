use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::images::ImageError;
use crate::ledger::LedgerError;
use crate::vision::VisionError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INVALID_QUANTITY`, `BATCH_TERMINAL`, `ITEM_NOT_FOUND`,
    /// `BATCH_NOT_FOUND`, `IMAGE_NOT_FOUND`, `PROVIDER_NOT_FOUND`,
    /// `PROVIDER_UNAVAILABLE`, `PROVIDER_CONFIG_ERROR`, `PROVIDER_TIMEOUT`,
    /// `PROVIDER_ERROR`, `CONFLICT`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_QUANTITY")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid quantity: requested 5 exceeds remaining 3")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidQuantity(String),
    BatchTerminal(String),
    ItemNotFound(String),
    BatchNotFound(String),
    ImageNotFound(String),
    Conflict(String),
    ProviderNotFound(String),
    ProviderUnavailable(String),
    ProviderConfig(String),
    ProviderTimeout(String),
    /// Transport failure or non-2xx answer from a remote provider.
    Provider(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::InvalidQuantity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_QUANTITY", msg)
            }
            AppError::BatchTerminal(msg) => (StatusCode::CONFLICT, "BATCH_TERMINAL", msg),
            AppError::ItemNotFound(msg) => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND", msg),
            AppError::BatchNotFound(msg) => (StatusCode::NOT_FOUND, "BATCH_NOT_FOUND", msg),
            AppError::ImageNotFound(msg) => (StatusCode::NOT_FOUND, "IMAGE_NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::ProviderNotFound(msg) => (StatusCode::NOT_FOUND, "PROVIDER_NOT_FOUND", msg),
            AppError::ProviderUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE", msg)
            }
            AppError::ProviderConfig(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_CONFIG_ERROR", msg)
            }
            AppError::ProviderTimeout(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "PROVIDER_TIMEOUT", msg)
            }
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { .. } => AppError::Validation(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidQuantity(_) => AppError::InvalidQuantity(err.to_string()),
            LedgerError::BatchTerminal { .. } => AppError::BatchTerminal(err.to_string()),
            LedgerError::ItemNotFound(_) => AppError::ItemNotFound(err.to_string()),
            LedgerError::BatchNotFound(_) => AppError::BatchNotFound(err.to_string()),
            LedgerError::Validation(msg) => AppError::Validation(msg),
            LedgerError::ProjectionDiverged { .. } | LedgerError::Db(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::NotFound(_) => AppError::ImageNotFound(err.to_string()),
            ImageError::Invalid(msg) => AppError::Validation(msg),
            ImageError::Storage(e) => e.into(),
            ImageError::Db(e) => e.into(),
        }
    }
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::ProviderNotFound(_) => AppError::ProviderNotFound(err.to_string()),
            VisionError::Unavailable { .. } => {
                tracing::warn!("Vision provider unavailable: {err}");
                AppError::ProviderUnavailable(err.to_string())
            }
            VisionError::Config(_) => {
                tracing::warn!("Vision provider misconfigured: {err}");
                AppError::ProviderConfig(err.to_string())
            }
            VisionError::ImageNotFound(_) => AppError::ImageNotFound(err.to_string()),
            VisionError::Timeout(_) => AppError::ProviderTimeout(err.to_string()),
            VisionError::Upstream { .. } | VisionError::Transport(_) => {
                tracing::warn!("Vision provider failed: {err}");
                AppError::Provider(err.to_string())
            }
            VisionError::Storage(e) => AppError::Internal(e.to_string()),
            VisionError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}
