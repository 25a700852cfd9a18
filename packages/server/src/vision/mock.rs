//! Offline provider producing repeatable detections from the item catalog.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::quantity::round_dp;
use common::storage::ContentHash;
use common::{Detection, StorageLocation};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sea_orm::DatabaseConnection;

use super::normalize::CatalogEntry;
use super::{Availability, VisionError, VisionProvider};
use crate::catalog;
use crate::ledger::default_expire_date;
use crate::utils::clock::today;

pub const MOCK_PROVIDER_ID: &str = "mock";

const SAMPLE_FLOOR: usize = 6;
const SAMPLE_CEILING: usize = 10;

pub struct MockVisionProvider {
    db: DatabaseConnection,
    default_shelf_life_days: i32,
}

impl MockVisionProvider {
    pub fn new(db: DatabaseConnection, default_shelf_life_days: i32) -> Self {
        Self {
            db,
            default_shelf_life_days,
        }
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn id(&self) -> &'static str {
        MOCK_PROVIDER_ID
    }

    fn name(&self) -> &'static str {
        "Mock (Offline)"
    }

    fn availability(&self) -> Availability {
        Availability::Available
    }

    async fn detect(&self, image_ref: &str, top_k: usize) -> Result<Vec<Detection>, VisionError> {
        let items: Vec<CatalogEntry> = catalog::list_items(&self.db)
            .await?
            .into_iter()
            .map(CatalogEntry::from)
            .collect();
        Ok(mock_detections(
            image_ref,
            top_k,
            &items,
            today(),
            self.default_shelf_life_days,
        ))
    }
}

/// Number of items drawn for a catalog of `catalog_len` entries.
pub fn sample_size(top_k: usize, catalog_len: usize) -> usize {
    top_k
        .min(SAMPLE_FLOOR.max(SAMPLE_CEILING.min(catalog_len)))
        .min(catalog_len)
}

/// Seed derived from the image reference. Stable across runs and platforms.
pub fn seed_for(image_ref: &str) -> u64 {
    ContentHash::compute(image_ref.as_bytes()).leading_u64()
}

/// Draw distinct catalog items with a generator seeded by the reference.
///
/// `catalog` must be in a stable order (by item id) for the output to be
/// reproducible.
pub fn mock_detections(
    image_ref: &str,
    top_k: usize,
    catalog: &[CatalogEntry],
    today: NaiveDate,
    default_shelf_life_days: i32,
) -> Vec<Detection> {
    let amount = sample_size(top_k, catalog.len());
    if amount == 0 {
        return Vec::new();
    }

    let seed = seed_for(image_ref);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let picks = index::sample(&mut rng, catalog.len(), amount);

    picks
        .into_iter()
        .map(|idx| {
            let item = &catalog[idx];
            let confidence = round_dp(rng.random_range(0.60..=0.95), 2);
            let quantity = round_dp(rng.random_range(1.0..=4.0), 1);
            let shelf_life = item
                .shelf_life_days_default
                .unwrap_or(default_shelf_life_days);
            Detection {
                temp_id: format!("det_{}_{}", item.id, seed),
                item_id: Some(item.id),
                item_name: item.name.clone(),
                confidence,
                quantity,
                unit: if item.default_unit.is_empty() {
                    "unit".to_string()
                } else {
                    item.default_unit.clone()
                },
                suggest_expire_date: Some(default_expire_date(today, shelf_life)),
                location: StorageLocation::Fridge,
            }
        })
        .collect()
}
