pub const SCHEMA: &str = r#"
-- entries table (the food log)
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    entry_date TEXT NOT NULL,
    item TEXT NOT NULL,
    quantity REAL NOT NULL DEFAULT 1,
    unit TEXT NOT NULL DEFAULT 'unit(s)',
    brand_info TEXT,
    carbs REAL,
    fats REAL,
    proteins REAL,
    calories REAL,
    carbs_today REAL,
    fats_today REAL,
    proteins_today REAL,
    calories_today REAL
);

CREATE INDEX IF NOT EXISTS idx_entries_entry_date ON entries(entry_date);

-- saved_items table (per-unit macro templates; duplicate names allowed,
-- lookups take the first match)
CREATE TABLE IF NOT EXISTS saved_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    carbs REAL NOT NULL,
    fats REAL NOT NULL,
    proteins REAL NOT NULL,
    calories REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_saved_items_name ON saved_items(name);

-- recaps table (append-only daily summaries)
CREATE TABLE IF NOT EXISTS recaps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recap_date TEXT NOT NULL,
    carbs REAL NOT NULL,
    fats REAL NOT NULL,
    proteins REAL NOT NULL,
    calories REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
