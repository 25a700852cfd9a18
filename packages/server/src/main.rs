use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use larder::config::AppConfig;
use larder::database::init_db;
use larder::seed;
use larder::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database).await?;
    seed::seed_catalog(&db).await?;
    seed::ensure_indexes(&db).await?;

    let blob_store = FilesystemBlobStore::new(
        &config.storage.blob_dir,
        config.storage.max_blob_size,
    )
    .await?;
    info!(dir = %config.storage.blob_dir.display(), "Blob store ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(db, config, Arc::new(blob_store));

    for provider in state.providers.list() {
        info!(
            provider = %provider.id,
            available = provider.available,
            reason = provider.reason.as_deref().unwrap_or(""),
            "Vision provider registered"
        );
    }

    let app = larder::build_router(state);

    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/scalar", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
