use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::ledger::Ledger;
use crate::vision::{HttpVisionProvider, MockVisionProvider, ProviderRegistry};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub ledger: Ledger,
    pub blob_store: Arc<dyn BlobStore>,
    pub providers: Arc<ProviderRegistry>,
}

impl AppState {
    /// Wire the ledger and the built-in vision providers around a database
    /// and blob store.
    pub fn new(db: DatabaseConnection, config: AppConfig, blob_store: Arc<dyn BlobStore>) -> Self {
        let shelf_life = config.inventory.default_shelf_life_days;

        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(MockVisionProvider::new(db.clone(), shelf_life)));
        providers.register(Arc::new(HttpVisionProvider::new(
            config.vision.http.clone(),
            db.clone(),
            blob_store.clone(),
        )));

        Self {
            ledger: Ledger::new(db.clone(), shelf_life),
            db,
            config,
            blob_store,
            providers: Arc::new(providers),
        }
    }
}
