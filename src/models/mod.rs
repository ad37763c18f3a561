mod bands;
mod entry;
mod macros;
mod submission;

pub use bands::{Bands, Label, RangeBand};
pub use entry::{LogEntry, NewEntry, RecapRecord, SavedItem};
pub use macros::MacroSet;
pub use submission::Submission;

/// Calendar-day truncation format used for same-day grouping and recaps.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub const DEFAULT_QUANTITY: f64 = 1.0;
pub const DEFAULT_UNIT: &str = "unit(s)";
