use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::image;

#[derive(Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    /// SHA-256 of the bytes, hex encoded.
    pub content_hash: String,
    #[schema(example = "fridge.jpg")]
    pub filename: String,
    #[schema(example = "image/jpeg")]
    pub content_type: Option<String>,
    #[schema(example = 48213)]
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<image::Model> for ImageResponse {
    fn from(m: image::Model) -> Self {
        Self {
            id: m.id,
            content_hash: m.content_hash,
            filename: m.filename,
            content_type: m.content_type,
            size: m.size,
            created_at: m.created_at,
        }
    }
}
