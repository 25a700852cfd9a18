//! Provider that forwards the photo to a remote detection service.
//!
//! Request: `POST {endpoint}` with `{"image_id", "image_base64", "top_k"}`.
//! Response: `{"detections": [...]}` with loosely typed entries, see
//! [`normalize`](super::normalize).

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Detection;
use common::storage::BlobStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tracing::{instrument, warn};

use super::normalize::{CatalogEntry, CatalogIndex, normalize_response};
use super::{Availability, VisionError, VisionProvider};
use crate::catalog;
use crate::config::HttpVisionConfig;
use crate::images::{self, ImageError};
use crate::utils::clock::today;

pub const HTTP_PROVIDER_ID: &str = "http";

pub struct HttpVisionProvider {
    config: HttpVisionConfig,
    client: reqwest::Client,
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
}

impl HttpVisionProvider {
    pub fn new(
        config: HttpVisionConfig,
        db: DatabaseConnection,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            db,
            blobs,
        }
    }

    async fn load_image(&self, image_ref: &str) -> Result<Vec<u8>, VisionError> {
        match images::get_image_bytes(&self.db, self.blobs.as_ref(), image_ref).await {
            Ok((_, bytes)) => Ok(bytes),
            Err(ImageError::NotFound(id)) => Err(VisionError::ImageNotFound(id)),
            Err(ImageError::Invalid(msg)) => Err(VisionError::ImageNotFound(msg)),
            Err(ImageError::Storage(e)) => Err(e.into()),
            Err(ImageError::Db(e)) => Err(e.into()),
        }
    }
}

/// Parse the extra-headers blob. Blank means no extra headers; anything
/// other than a JSON object of strings is a configuration error.
pub fn parse_extra_headers(raw: Option<&str>) -> Result<HeaderMap, VisionError> {
    let mut headers = HeaderMap::new();
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(headers);
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| VisionError::Config(format!("headers_json is not valid JSON: {e}")))?;
    let Value::Object(map) = value else {
        return Err(VisionError::Config(
            "headers_json must be a JSON object".into(),
        ));
    };

    for (name, value) in map {
        let Value::String(value) = value else {
            return Err(VisionError::Config(format!(
                "header '{name}' must be a string"
            )));
        };
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| VisionError::Config(format!("invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|e| VisionError::Config(format!("invalid value for header '{name}': {e}")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[async_trait]
impl VisionProvider for HttpVisionProvider {
    fn id(&self) -> &'static str {
        HTTP_PROVIDER_ID
    }

    fn name(&self) -> &'static str {
        "HTTP Vision (Generic)"
    }

    fn availability(&self) -> Availability {
        match self.config.endpoint() {
            Some(_) => Availability::Available,
            None => Availability::Unavailable("vision.http.endpoint is not configured".into()),
        }
    }

    #[instrument(skip(self))]
    async fn detect(&self, image_ref: &str, top_k: usize) -> Result<Vec<Detection>, VisionError> {
        let Some(endpoint) = self.config.endpoint() else {
            return Err(VisionError::Unavailable {
                provider: HTTP_PROVIDER_ID.to_string(),
                reason: "vision.http.endpoint is not configured".into(),
            });
        };
        let headers = parse_extra_headers(self.config.headers_json.as_deref())?;
        let bytes = self.load_image(image_ref).await?;

        let payload = json!({
            "image_id": image_ref,
            "image_base64": STANDARD.encode(&bytes),
            "top_k": top_k,
        });

        let timeout = self.config.timeout();
        let response = self
            .client
            .post(endpoint)
            .headers(headers)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VisionError::Timeout(timeout.as_secs())
                } else {
                    VisionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, endpoint, "Vision endpoint returned an error status");
            return Err(VisionError::Upstream {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                VisionError::Timeout(timeout.as_secs())
            } else {
                VisionError::Transport(format!("invalid response body: {e}"))
            }
        })?;

        let catalog = CatalogIndex::new(
            catalog::list_items(&self.db)
                .await?
                .into_iter()
                .map(CatalogEntry::from),
        );
        Ok(normalize_response(&body, image_ref, &catalog, today()))
    }
}
