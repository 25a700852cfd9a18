#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a batch.
///
/// `InStock` is the only non-terminal state. A batch becomes `Consumed` or
/// `Discarded` only when a consume/discard event brings its quantity to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "in_stock"))]
    InStock,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "consumed"))]
    Consumed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "discarded"))]
    Discarded,
}

impl BatchStatus {
    pub const ALL: &'static [BatchStatus] = &[Self::InStock, Self::Consumed, Self::Discarded];

    /// Returns true once no further quantity-changing event may apply.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InStock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::Consumed => "consumed",
            Self::Discarded => "discarded",
        }
    }
}

impl Default for BatchStatus {
    fn default() -> Self {
        Self::InStock
    }
}

/// Where a batch is physically kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "fridge"))]
    Fridge,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "freezer"))]
    Freezer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pantry"))]
    Pantry,
}

impl StorageLocation {
    pub const ALL: &'static [StorageLocation] = &[Self::Fridge, Self::Freezer, Self::Pantry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fridge => "fridge",
            Self::Freezer => "freezer",
            Self::Pantry => "pantry",
        }
    }
}

impl Default for StorageLocation {
    fn default() -> Self {
        Self::Fridge
    }
}

/// How a batch entered the inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "manual"))]
    Manual,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "image"))]
    Image,
}

impl SourceType {
    pub const ALL: &'static [SourceType] = &[Self::Manual, Self::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Image => "image",
        }
    }
}

/// Kind of ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Batch creation. Delta equals the initial quantity.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "created"))]
    Created,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "consumed"))]
    Consumed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "discarded"))]
    Discarded,
    /// Direct quantity correction. Delta is `new - old`.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "adjusted"))]
    Adjusted,
}

impl EventType {
    pub const ALL: &'static [EventType] = &[
        Self::Created,
        Self::Consumed,
        Self::Discarded,
        Self::Adjusted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Consumed => "consumed",
            Self::Discarded => "discarded",
            Self::Adjusted => "adjusted",
        }
    }

    /// Terminal batch status reached when an outflow of this kind empties a batch.
    pub fn terminal_status(&self) -> Option<BatchStatus> {
        match self {
            Self::Consumed => Some(BatchStatus::Consumed),
            Self::Discarded => Some(BatchStatus::Discarded),
            Self::Created | Self::Adjusted => None,
        }
    }
}

/// Error when parsing an unknown enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} '{invalid}'. Valid values: {valid}")]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, invalid: &str, valid: impl Iterator<Item = &'static str>) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid: valid.collect::<Vec<_>>().join(", "),
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| {
                        ParseEnumError::new($kind, s, Self::ALL.iter().map(|v| v.as_str()))
                    })
            }
        }
    };
}

impl_str_enum!(BatchStatus, "status");
impl_str_enum!(StorageLocation, "location");
impl_str_enum!(SourceType, "source type");
impl_str_enum!(EventType, "event type");
