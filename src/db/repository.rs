use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{LogEntry, MacroSet, NewEntry, RecapRecord, SavedItem};

use super::schema::SCHEMA;

const ENTRY_COLUMNS: &str = "id, timestamp, entry_date, item, quantity, unit, brand_info, \
     carbs, fats, proteins, calories, \
     carbs_today, fats_today, proteins_today, calories_today";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Entry operations

    pub async fn append_entry(&self, entry: NewEntry) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO entries (timestamp, entry_date, item, quantity, unit, brand_info)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        entry.timestamp,
                        entry.entry_date,
                        entry.item,
                        entry.quantity,
                        entry.unit,
                        entry.brand_info,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn update_entry_macros(&self, id: i64, macros: MacroSet) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE entries SET carbs = ?1, fats = ?2, proteins = ?3, calories = ?4 WHERE id = ?5",
                    params![macros.carbs, macros.fats, macros.proteins, macros.calories, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn update_entry_totals(&self, id: i64, totals: MacroSet) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE entries SET carbs_today = ?1, fats_today = ?2, proteins_today = ?3, calories_today = ?4 WHERE id = ?5",
                    params![totals.carbs, totals.fats, totals.proteins, totals.calories, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// All entries logged on the given calendar day, oldest first.
    pub async fn entries_on_date(&self, date: &str) -> Result<Vec<LogEntry>> {
        let date = date.to_string();
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE entry_date = ?1 ORDER BY id"
                ))?;
                let entries = stmt
                    .query_map(params![date], |row| Ok(entry_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    pub async fn latest_entry(&self) -> Result<Option<LogEntry>> {
        let entry = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY id DESC LIMIT 1"
                ))?;
                let entry = stmt
                    .query_row([], |row| Ok(entry_from_row(row)))
                    .optional()?;
                Ok(entry)
            })
            .await?;
        Ok(entry)
    }

    /// The row immediately preceding the given entry in insertion order.
    pub async fn entry_before(&self, id: i64) -> Result<Option<LogEntry>> {
        let entry = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE id < ?1 ORDER BY id DESC LIMIT 1"
                ))?;
                let entry = stmt
                    .query_row(params![id], |row| Ok(entry_from_row(row)))
                    .optional()?;
                Ok(entry)
            })
            .await?;
        Ok(entry)
    }

    // Saved-item operations

    pub async fn insert_saved_item(&self, name: &str, per_unit: MacroSet) -> Result<i64> {
        let name = name.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO saved_items (name, carbs, fats, proteins, calories)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        name,
                        per_unit.carbs,
                        per_unit.fats,
                        per_unit.proteins,
                        per_unit.calories,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Exact-name lookup. Duplicates are not rejected; the first match wins.
    pub async fn saved_item(&self, name: &str) -> Result<Option<SavedItem>> {
        let name = name.to_string();
        let item = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, carbs, fats, proteins, calories
                     FROM saved_items WHERE name = ?1 ORDER BY id LIMIT 1",
                )?;
                let item = stmt
                    .query_row(params![name], |row| Ok(saved_item_from_row(row)))
                    .optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    /// Names for the form's selectable food-item list, in insertion order.
    pub async fn saved_item_names(&self) -> Result<Vec<String>> {
        let names = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM saved_items ORDER BY id")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await?;
        Ok(names)
    }

    // Recap operations

    pub async fn append_recap(&self, date: &str, totals: MacroSet) -> Result<i64> {
        let date = date.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO recaps (recap_date, carbs, fats, proteins, calories)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![date, totals.carbs, totals.fats, totals.proteins, totals.calories],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    #[allow(dead_code)]
    pub async fn recaps(&self) -> Result<Vec<RecapRecord>> {
        let recaps = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, recap_date, carbs, fats, proteins, calories FROM recaps ORDER BY id",
                )?;
                let recaps = stmt
                    .query_map([], |row| Ok(recap_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(recaps)
            })
            .await?;
        Ok(recaps)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn macro_set_from_columns(
    carbs: Option<f64>,
    fats: Option<f64>,
    proteins: Option<f64>,
    calories: Option<f64>,
) -> Option<MacroSet> {
    // All-NULL means the values were never written; a partially written set
    // still counts, with missing cells as zero.
    match (carbs, fats, proteins, calories) {
        (None, None, None, None) => None,
        _ => Some(MacroSet {
            carbs: carbs.unwrap_or(0.0),
            fats: fats.unwrap_or(0.0),
            proteins: proteins.unwrap_or(0.0),
            calories: calories.unwrap_or(0.0),
        }),
    }
}

fn entry_from_row(row: &Row) -> LogEntry {
    LogEntry {
        id: row.get(0).unwrap(),
        timestamp: row
            .get::<_, String>(1)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        entry_date: row.get(2).unwrap(),
        item: row.get(3).unwrap(),
        quantity: row.get(4).unwrap(),
        unit: row.get(5).unwrap(),
        brand_info: row.get(6).unwrap(),
        macros: macro_set_from_columns(
            row.get(7).unwrap(),
            row.get(8).unwrap(),
            row.get(9).unwrap(),
            row.get(10).unwrap(),
        ),
        totals: macro_set_from_columns(
            row.get(11).unwrap(),
            row.get(12).unwrap(),
            row.get(13).unwrap(),
            row.get(14).unwrap(),
        ),
    }
}

fn saved_item_from_row(row: &Row) -> SavedItem {
    SavedItem {
        id: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        per_unit: MacroSet {
            carbs: row.get(2).unwrap(),
            fats: row.get(3).unwrap(),
            proteins: row.get(4).unwrap(),
            calories: row.get(5).unwrap(),
        },
    }
}

fn recap_from_row(row: &Row) -> RecapRecord {
    RecapRecord {
        id: row.get(0).unwrap(),
        date: row.get(1).unwrap(),
        totals: MacroSet {
            carbs: row.get(2).unwrap(),
            fats: row.get(3).unwrap(),
            proteins: row.get(4).unwrap(),
            calories: row.get(5).unwrap(),
        },
    }
}
