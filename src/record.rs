//! The ingestion row model: a fixed 5-column schema parsed tolerantly.
//!
//! One raw CSV row becomes one [`IngestionRecord`]. Parsing never fails:
//! a field that is empty or does not parse is carried as `None` and the
//! row flows on to validation. The original textual fields are kept on the
//! record so the pipeline can pass them through to its output partitions
//! byte-for-byte (modulo standard CSV quoting).

use chrono::NaiveDateTime;
use csv::StringRecord;
use std::str::FromStr;

/// The exact input/output header, in column order.
pub const HEADER: [&str; 5] = ["row_id", "pickup_datetime", "lat", "lon", "base"];

/// External timestamp format (`M/d/yyyy H:mm:ss`). Chrono's numeric fields
/// accept the unpadded month/day/hour this dataset uses.
pub const PICKUP_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

const COL_ROW_ID: usize = 0;
const COL_PICKUP_DATETIME: usize = 1;
const COL_LAT: usize = 2;
const COL_LON: usize = 3;
const COL_BASE: usize = 4;

/// One logical ingestion row.
///
/// `row_id` and `pickup_datetime` gate acceptance (see [`crate::validation`]);
/// `lat`, `lon`, and `base` are descriptive only.
#[derive(Debug, Clone)]
pub struct IngestionRecord {
    pub row_id: Option<i64>,
    pub pickup_datetime: Option<NaiveDateTime>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub base: String,
    raw: StringRecord,
}

impl IngestionRecord {
    /// Parse a raw CSV row into an `IngestionRecord`.
    ///
    /// Short rows are tolerated (missing columns read as empty). Each typed
    /// field is attempted independently; a failed parse yields `None` for
    /// that field only.
    pub fn from_raw(raw: StringRecord) -> Self {
        let row_id = parse_opt::<i64>(field(&raw, COL_ROW_ID));
        let pickup_datetime = parse_pickup(field(&raw, COL_PICKUP_DATETIME));
        let lat = parse_opt::<f64>(field(&raw, COL_LAT));
        let lon = parse_opt::<f64>(field(&raw, COL_LON));
        let base = field(&raw, COL_BASE).to_string();
        Self {
            row_id,
            pickup_datetime,
            lat,
            lon,
            base,
            raw,
        }
    }

    /// The original textual fields, untouched.
    pub fn raw(&self) -> &StringRecord {
        &self.raw
    }

    /// Original text of the `row_id` column.
    pub fn raw_row_id(&self) -> &str {
        field(&self.raw, COL_ROW_ID)
    }

    /// Original text of the `pickup_datetime` column.
    pub fn raw_pickup_datetime(&self) -> &str {
        field(&self.raw, COL_PICKUP_DATETIME)
    }
}

fn field<'r>(raw: &'r StringRecord, idx: usize) -> &'r str {
    raw.get(idx).unwrap_or("")
}

/// Empty or whitespace-only text is absent; anything else must parse fully.
fn parse_opt<T: FromStr>(text: &str) -> Option<T> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<T>().ok()
}

fn parse_pickup(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(text, PICKUP_DATETIME_FORMAT).ok()
}
