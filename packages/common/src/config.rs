use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration for uploaded images.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Directory holding the sharded blob tree. Default: "./data/blobs".
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
    /// Largest accepted blob in bytes. Default: 20 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_blob_size() -> u64 {
    20 * 1024 * 1024
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            blob_dir: default_blob_dir(),
            max_blob_size: default_max_blob_size(),
        }
    }
}
