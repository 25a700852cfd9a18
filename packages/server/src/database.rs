use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.clone());
    let timeout = Duration::from_secs(config.connect_timeout_secs);

    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    // SQLite allows a single writer; a shared connection avoids busy errors.
    if is_sqlite(&config.url) {
        opt.max_connections(1);
    }

    let db = Database::connect(opt).await?;
    db.get_schema_registry("larder::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

pub fn is_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:")
}
