//! Turns loosely shaped provider output into [`Detection`]s.
//!
//! Every field has a fallback, so one odd entry never aborts the rest.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use common::{Detection, StorageLocation};
use serde_json::Value;
use tracing::warn;

use crate::entity::item;

/// Label used when a provider entry names nothing.
pub const UNKNOWN_ITEM_NAME: &str = "未知";
const FALLBACK_UNIT: &str = "unit";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: i32,
    pub name: String,
    pub default_unit: String,
    pub shelf_life_days_default: Option<i32>,
}

impl From<item::Model> for CatalogEntry {
    fn from(item: item::Model) -> Self {
        Self {
            id: item.id,
            name: item.name,
            default_unit: item.default_unit,
            shelf_life_days_default: item.shelf_life_days_default,
        }
    }
}

/// Exact-name lookup over the item catalog.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    by_name: HashMap<String, CatalogEntry>,
}

impl CatalogIndex {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            by_name: entries.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name.get(name)
    }
}

/// Normalize the `detections` array of a provider response. A missing or
/// non-array field yields no detections.
pub fn normalize_response(
    response: &Value,
    image_id: &str,
    catalog: &CatalogIndex,
    today: NaiveDate,
) -> Vec<Detection> {
    let Some(entries) = response.get("detections").and_then(Value::as_array) else {
        warn!(image_id, "Vision response carried no detections array");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            if !entry.is_object() {
                warn!(image_id, idx, "Skipping non-object detection entry");
                return None;
            }
            Some(normalize_entry(entry, idx, image_id, catalog, today))
        })
        .collect()
}

pub fn normalize_entry(
    entry: &Value,
    idx: usize,
    image_id: &str,
    catalog: &CatalogIndex,
    today: NaiveDate,
) -> Detection {
    let raw_name = non_empty_str(entry, "name")
        .or_else(|| non_empty_str(entry, "item_name"))
        .unwrap_or(UNKNOWN_ITEM_NAME);
    let matched = catalog.lookup(raw_name);

    let temp_id = match entry.get("temp_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("det_http_{image_id}_{idx}"),
    };

    let confidence = number_field(entry, "confidence")
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0);

    let quantity = number_field(entry, "quantity")
        .filter(|q| q.is_finite() && *q > 0.0)
        .unwrap_or(1.0);

    let unit = non_empty_str(entry, "unit")
        .map(str::to_string)
        .or_else(|| matched.map(|m| m.default_unit.clone()))
        .unwrap_or_else(|| FALLBACK_UNIT.to_string());

    let location = non_empty_str(entry, "location")
        .and_then(|l| l.parse::<StorageLocation>().ok())
        .unwrap_or_default();

    Detection {
        temp_id,
        item_id: matched.map(|m| m.id),
        item_name: matched
            .map(|m| m.name.clone())
            .unwrap_or_else(|| raw_name.to_string()),
        confidence,
        quantity,
        unit,
        suggest_expire_date: suggested_expiry(entry, today),
        location,
    }
}

/// Explicit date first, then a whole-day offset from `today`.
fn suggested_expiry(entry: &Value, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(raw) = non_empty_str(entry, "suggest_expire_date") {
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) => return Some(date),
            Err(_) => warn!(raw, "Ignoring malformed suggest_expire_date"),
        }
    }

    let days = match entry.get("suggest_expire_days")? {
        Value::Null => return None,
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let Some(days) = days else {
        warn!("Ignoring malformed suggest_expire_days");
        return None;
    };

    if days >= 0 {
        today.checked_add_days(Days::new(days as u64))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn non_empty_str<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn number_field(entry: &Value, key: &str) -> Option<f64> {
    match entry.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
