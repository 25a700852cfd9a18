use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::detection::*;
use crate::state::AppState;
use crate::vision::mock::MOCK_PROVIDER_ID;

#[utoipa::path(
    get,
    path = "/providers",
    tag = "Detection",
    operation_id = "listProviders",
    summary = "List vision providers",
    responses(
        (status = 200, description = "Providers with availability", body = ProviderListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_providers(State(state): State<AppState>) -> Json<ProviderListResponse> {
    Json(ProviderListResponse {
        data: state.providers.list(),
    })
}

/// Run a vision provider over an image.
#[utoipa::path(
    post,
    path = "/detections",
    tag = "Detection",
    operation_id = "detect",
    summary = "Detect candidate batches in an image",
    description = "Returns candidate batches for review. Nothing is stored; accepted candidates go to `POST /batches/bulk`.",
    request_body = DetectRequest,
    responses(
        (status = 200, description = "Detections", body = DetectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown provider or image (PROVIDER_NOT_FOUND, IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Remote provider failed (PROVIDER_ERROR)", body = ErrorBody),
        (status = 503, description = "Provider unusable (PROVIDER_UNAVAILABLE, PROVIDER_CONFIG_ERROR)", body = ErrorBody),
        (status = 504, description = "Remote provider timed out (PROVIDER_TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn detect(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DetectRequest>,
) -> Result<Json<DetectResponse>, AppError> {
    let image_id = payload.image_id.trim().to_string();
    if image_id.is_empty() {
        return Err(AppError::Validation("image_id is required".into()));
    }
    let top_k = payload.top_k.unwrap_or(DEFAULT_TOP_K);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }
    let provider = payload
        .provider
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| MOCK_PROVIDER_ID.to_string());

    let detections = state.providers.detect(&provider, &image_id, top_k).await?;
    Ok(Json(DetectResponse {
        provider,
        image_id,
        detections,
    }))
}
