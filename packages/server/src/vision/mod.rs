//! Photo-to-candidate-batch detection.
//!
//! Providers sit behind [`VisionProvider`] and are looked up by id in a
//! [`ProviderRegistry`]. Whatever a provider returns is reported as
//! [`Detection`]s; nothing here writes to the ledger.

mod error;
pub mod http;
pub mod mock;
pub mod normalize;
mod registry;

use async_trait::async_trait;
use common::Detection;

pub use error::VisionError;
pub use http::HttpVisionProvider;
pub use mock::MockVisionProvider;
pub use registry::{ProviderInfo, ProviderRegistry};

/// Result of a provider's cheap self-check. Evaluated before any I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Registry key, e.g. `"mock"`.
    fn id(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &'static str;

    fn availability(&self) -> Availability;

    /// Propose at most `top_k` candidate batches for an image reference.
    async fn detect(&self, image_ref: &str, top_k: usize) -> Result<Vec<Detection>, VisionError>;
}
