use std::collections::HashMap;
use std::sync::Arc;

use common::Detection;
use serde::Serialize;
use tracing::{info, warn};

use super::{Availability, VisionError, VisionProvider};

/// Public view of a registered provider, suitable for API responses.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProviderInfo {
    #[schema(example = "mock")]
    pub id: String,
    #[schema(example = "Mock (Offline)")]
    pub name: String,
    pub available: bool,
    /// Why the provider cannot be used right now.
    pub reason: Option<String>,
}

/// Providers keyed by id.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn VisionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, replacing any previous one with the same id.
    pub fn register(&mut self, provider: Arc<dyn VisionProvider>) {
        let id = provider.id();
        if self.providers.insert(id, provider).is_some() {
            warn!(provider = id, "Replaced already registered vision provider");
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn VisionProvider>, VisionError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| VisionError::ProviderNotFound(id.to_string()))
    }

    /// Every provider with its current availability, ordered by id.
    pub fn list(&self) -> Vec<ProviderInfo> {
        let mut infos: Vec<ProviderInfo> = self
            .providers
            .values()
            .map(|p| {
                let (available, reason) = match p.availability() {
                    Availability::Available => (true, None),
                    Availability::Unavailable(reason) => (false, Some(reason)),
                };
                ProviderInfo {
                    id: p.id().to_string(),
                    name: p.name().to_string(),
                    available,
                    reason,
                }
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Resolve a provider, check it is usable, then run it.
    pub async fn detect(
        &self,
        provider_id: &str,
        image_ref: &str,
        top_k: usize,
    ) -> Result<Vec<Detection>, VisionError> {
        let provider = self.get(provider_id)?;
        if let Availability::Unavailable(reason) = provider.availability() {
            return Err(VisionError::Unavailable {
                provider: provider_id.to_string(),
                reason,
            });
        }

        let detections = provider.detect(image_ref, top_k).await?;
        info!(
            provider = provider_id,
            image_ref,
            top_k,
            count = detections.len(),
            "Detection finished"
        );
        Ok(detections)
    }
}
