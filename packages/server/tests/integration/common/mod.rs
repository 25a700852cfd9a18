use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use ::common::config::StorageAppConfig;
use ::common::storage::FilesystemBlobStore;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::TempDir;

use larder::config::{
    AppConfig, CorsConfig, DatabaseConfig, InventoryConfig, ServerConfig, VisionConfig,
};
use larder::state::AppState;

pub mod routes {
    pub const BATCHES: &str = "/api/v1/batches";
    pub const BATCHES_BULK: &str = "/api/v1/batches/bulk";
    pub const BATCHES_EXPIRING: &str = "/api/v1/batches/expiring";
    pub const EVENTS: &str = "/api/v1/events";
    pub const ITEMS: &str = "/api/v1/items";
    pub const RECIPES: &str = "/api/v1/recipes";
    pub const RECIPES_FEASIBLE: &str = "/api/v1/recipes/feasible";
    pub const DASHBOARD: &str = "/api/v1/dashboard/summary";
    pub const IMAGES: &str = "/api/v1/images";
    pub const PROVIDERS: &str = "/api/v1/providers";
    pub const DETECTIONS: &str = "/api/v1/detections";

    pub fn batch(id: i32) -> String {
        format!("/api/v1/batches/{id}")
    }

    pub fn batch_consume(id: i32) -> String {
        format!("/api/v1/batches/{id}/consume")
    }

    pub fn batch_discard(id: i32) -> String {
        format!("/api/v1/batches/{id}/discard")
    }

    pub fn batch_events(id: i32) -> String {
        format!("/api/v1/batches/{id}/events")
    }

    pub fn image(id: &str) -> String {
        format!("/api/v1/images/{id}")
    }

    pub fn image_content(id: &str) -> String {
        format!("/api/v1/images/{id}/content")
    }
}

/// A running test server backed by a scratch SQLite file.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub bytes_len: usize,
    pub content_type: Option<String>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a config tweak applied before the state is built.
    pub async fn spawn_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}/test.db?mode=rwc", dir.path().display());

        let mut app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 1,
                connect_timeout_secs: 8,
            },
            storage: StorageAppConfig {
                blob_dir: dir.path().join("blobs"),
                max_blob_size: 1024 * 1024,
            },
            inventory: InventoryConfig::default(),
            vision: VisionConfig::default(),
        };
        tweak(&mut app_config);

        let db = larder::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize test database");
        larder::seed::seed_catalog(&db)
            .await
            .expect("Failed to seed test database");
        larder::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let blob_store = FilesystemBlobStore::new(
            &app_config.storage.blob_dir,
            app_config.storage.max_blob_size,
        )
        .await
        .expect("Failed to create blob store");

        let state = AppState::new(db.clone(), app_config, Arc::new(blob_store));
        let app = larder::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn upload(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(routes::IMAGES))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload a small PNG-named image and return its id.
    pub async fn upload_image(&self, bytes: &[u8]) -> String {
        let res = self.upload("fridge.png", "image/png", bytes.to_vec()).await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.body["id"].as_str().unwrap().to_string()
    }

    /// Create a batch by item name and return its `id`.
    pub async fn create_batch(&self, item_name: &str, quantity: f64) -> i32 {
        let res = self
            .post(
                routes::BATCHES,
                &json!({ "item_name": item_name, "quantity": quantity }),
            )
            .await;
        assert_eq!(res.status, 201, "create_batch failed: {}", res.text);
        res.id()
    }

    /// Create a batch expiring `offset` days from today.
    pub async fn create_batch_expiring(&self, item_name: &str, offset: i64) -> i32 {
        let res = self
            .post(
                routes::BATCHES,
                &json!({
                    "item_name": item_name,
                    "quantity": 1,
                    "expire_date": days_from_today(offset),
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_batch failed: {}", res.text);
        res.id()
    }

    pub async fn consume(&self, id: i32, quantity: f64) -> TestResponse {
        self.post(&routes::batch_consume(id), &json!({ "quantity": quantity }))
            .await
    }

    /// Signed deltas of a batch's events, oldest first.
    pub async fn event_deltas(&self, id: i32) -> Vec<f64> {
        let res = self.get(&routes::batch_events(id)).await;
        assert_eq!(res.status, 200, "list events failed: {}", res.text);
        res.body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["delta_quantity"].as_f64().unwrap())
            .collect()
    }
}

pub fn days_from_today(offset: i64) -> NaiveDate {
    let today = Local::now().date_naive();
    if offset >= 0 {
        today + Days::new(offset as u64)
    } else {
        today - Days::new(offset.unsigned_abs())
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().await.unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            bytes_len: bytes.len(),
            content_type,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
