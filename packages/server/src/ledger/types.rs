use chrono::NaiveDate;
use common::{BatchStatus, SourceType, StorageLocation};

/// How a new batch names its item.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemRef {
    /// Must exist.
    Id(i32),
    /// Looked up by exact name, created on the fly when missing.
    Name(String),
}

/// One batch to create.
#[derive(Clone, Debug)]
pub struct NewBatch {
    pub item: ItemRef,
    pub quantity: f64,
    /// Falls back to the item's default unit.
    pub unit: Option<String>,
    /// Falls back to today plus the item's shelf life.
    pub expire_date: Option<NaiveDate>,
    pub location: Option<StorageLocation>,
}

/// Provenance shared by every batch of one creation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchSource {
    Manual,
    Image(String),
}

impl BatchSource {
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Manual => SourceType::Manual,
            Self::Image(_) => SourceType::Image,
        }
    }

    pub fn source_ref(&self) -> Option<String> {
        match self {
            Self::Manual => None,
            Self::Image(id) => Some(id.clone()),
        }
    }

    /// Note recorded on each `created` event.
    pub fn note(&self) -> String {
        match self {
            Self::Manual => "manual".to_string(),
            Self::Image(id) => format!("image:{id}"),
        }
    }
}

/// Fields a caller may change on an in-stock batch.
#[derive(Clone, Debug, Default)]
pub struct BatchPatch {
    pub quantity: Option<f64>,
    pub expire_date: Option<NaiveDate>,
    pub location: Option<StorageLocation>,
}

impl BatchPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.expire_date.is_none() && self.location.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct BatchFilter {
    pub location: Option<StorageLocation>,
    pub status: Option<BatchStatus>,
    /// Case-insensitive substring of the item name snapshot.
    pub keyword: Option<String>,
    pub page: u64,
    pub per_page: u64,
}
