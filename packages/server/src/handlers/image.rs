use axum::{
    Json,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::storage::ContentHash;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::images::{self, ImageUpload};
use crate::models::image::ImageResponse;
use crate::state::AppState;

/// Request body cap for uploads: the blob limit plus room for multipart framing.
pub fn image_upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_blob_size.saturating_add(64 * 1024)).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    post,
    path = "/images",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload a photo",
    description = "Stores the `file` multipart field. Identical bytes are stored once; every upload still gets its own image id.",
    request_body(content_type = "multipart/form-data", description = "Image file in field `file`"),
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Missing, empty, oversized or non-image file (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageResponse>), AppError> {
    let max_size = state.config.storage.max_blob_size;
    let mut upload: Option<(ImageUpload, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let meta = ImageUpload {
            filename: field.file_name().unwrap_or("upload").to_string(),
            content_type: field.content_type().map(str::to_string),
        };
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((meta, bytes));
    }

    let (meta, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let image = images::store_image_bytes(&state.db, state.blob_store.as_ref(), meta, &bytes).await?;

    Ok((StatusCode::CREATED, Json(image.into())))
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Get image metadata",
    params(("id" = String, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image metadata", body = ImageResponse),
        (status = 404, description = "Image not found (IMAGE_NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    Ok(Json(images::find_image(&state.db, &id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/images/{id}/content",
    tag = "Images",
    operation_id = "getImageContent",
    summary = "Download image bytes",
    params(("id" = String, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Image or its bytes not found (IMAGE_NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_image_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let image = images::find_image(&state.db, &id).await?;
    let hash = ContentHash::from_hex(&image.content_hash)?;
    let reader = match state.blob_store.get_stream(&hash).await {
        Ok(reader) => reader,
        Err(common::storage::StorageError::NotFound(_)) => {
            return Err(AppError::ImageNotFound(format!("Image {id} not found")));
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = image
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, image.size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}
