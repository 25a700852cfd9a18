use common::Detection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::vision::ProviderInfo;

pub const DEFAULT_TOP_K: usize = 10;
pub const MAX_TOP_K: usize = 50;

#[derive(Deserialize, ToSchema)]
pub struct DetectRequest {
    /// Uploaded image id. The mock provider accepts any reference string.
    #[schema(example = "demo_random")]
    pub image_id: String,
    /// Provider id. Defaults to `mock`.
    #[schema(example = "mock")]
    pub provider: Option<String>,
    /// 1-50, default 10.
    #[schema(example = 10)]
    pub top_k: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct DetectResponse {
    pub provider: String,
    pub image_id: String,
    pub detections: Vec<Detection>,
}

#[derive(Serialize, ToSchema)]
pub struct ProviderListResponse {
    pub data: Vec<ProviderInfo>,
}
