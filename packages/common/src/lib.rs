pub mod config;
pub mod detection;
pub mod inventory;
pub mod quantity;
pub mod storage;

pub use detection::Detection;
pub use inventory::{BatchStatus, EventType, ParseEnumError, SourceType, StorageLocation};
