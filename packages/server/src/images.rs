//! Uploaded photos: metadata rows plus content-addressed bytes.

use chrono::Utc;
use common::storage::{BlobStore, ContentHash, StorageError};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::entity::image;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Metadata accompanying uploaded bytes.
#[derive(Clone, Debug, Default)]
pub struct ImageUpload {
    pub filename: String,
    /// Declared by the client. Guessed from the filename when absent.
    pub content_type: Option<String>,
}

/// Resolve the MIME type for an upload and make sure it is an image.
pub fn image_content_type(upload: &ImageUpload) -> Result<String, ImageError> {
    let declared = upload
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
        .map(str::to_ascii_lowercase);

    let resolved = declared.unwrap_or_else(|| {
        mime_guess::from_path(&upload.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });

    if !resolved.starts_with("image/") {
        return Err(ImageError::Invalid(format!(
            "Expected an image upload, got '{resolved}'"
        )));
    }
    Ok(resolved)
}

/// Store bytes in the blob store and record an image row.
pub async fn store_image_bytes<C: ConnectionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    upload: ImageUpload,
    bytes: &[u8],
) -> Result<image::Model, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Invalid("Uploaded file is empty".into()));
    }
    let content_type = image_content_type(&upload)?;
    let hash = blobs.put(bytes).await?;

    let model = image::ActiveModel {
        id: Set(Uuid::now_v7()),
        content_hash: Set(hash.to_hex()),
        filename: Set(upload.filename),
        content_type: Set(Some(content_type)),
        size: Set(bytes.len() as i64),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        image_id = %model.id,
        hash = %model.content_hash,
        size = model.size,
        "Image stored"
    );
    Ok(model)
}

/// Look up an image by its id string. Malformed ids count as unknown.
pub async fn find_image<C: ConnectionTrait>(
    db: &C,
    image_id: &str,
) -> Result<image::Model, ImageError> {
    let id = Uuid::parse_str(image_id.trim())
        .map_err(|_| ImageError::NotFound(image_id.to_string()))?;
    image::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ImageError::NotFound(image_id.to_string()))
}

/// Image row and its bytes. Missing bytes are reported as a missing image.
pub async fn get_image_bytes<C: ConnectionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    image_id: &str,
) -> Result<(image::Model, Vec<u8>), ImageError> {
    let image = find_image(db, image_id).await?;
    let hash = ContentHash::from_hex(&image.content_hash)?;
    match blobs.get(&hash).await {
        Ok(bytes) => Ok((image, bytes)),
        Err(StorageError::NotFound(_)) => Err(ImageError::NotFound(image_id.to_string())),
        Err(e) => Err(e.into()),
    }
}
