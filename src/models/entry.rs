use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MacroSet;

/// One row in the food log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// Calendar day in MM/DD/YYYY, local to the machine that logged the entry.
    pub entry_date: String,
    pub item: String,
    pub quantity: f64,
    pub unit: String,
    pub brand_info: Option<String>,
    /// Resolved macros; None until the entry has been processed successfully.
    pub macros: Option<MacroSet>,
    /// Same-day running totals as of this entry.
    pub totals: Option<MacroSet>,
}

/// Fields needed to append a raw entry, before macro resolution.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub timestamp: String,
    pub entry_date: String,
    pub item: String,
    pub quantity: f64,
    pub unit: String,
    pub brand_info: Option<String>,
}

/// A reusable per-unit macro template, keyed by display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: i64,
    pub name: String,
    pub per_unit: MacroSet,
}

/// One appended recap row per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecapRecord {
    pub id: i64,
    pub date: String,
    pub totals: MacroSet,
}
