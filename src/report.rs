//! Benchmark result bookkeeping: append one flat row per run to a shared
//! results CSV, writing the header exactly once.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::{OpenOptions, create_dir_all};
use std::path::Path;

/// Column order of the results file.
pub const RESULTS_HEADER: [&str; 8] = [
    "tool",
    "dataset",
    "rows",
    "wall_time_s",
    "peak_rss_mb",
    "accepted_rows",
    "rejected_rows",
    "notes",
];

/// One benchmark observation, as recorded.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub tool: String,
    pub dataset: String,
    pub rows: u64,
    pub wall_time_s: f64,
    /// `None` renders as an empty field (the sampler may be unavailable).
    pub peak_rss_mb: Option<f64>,
    pub accepted_rows: u64,
    pub rejected_rows: u64,
    pub notes: String,
}

/// Append `row` to the results file at `path`.
///
/// Parent directories are created; the header is written only when the
/// file is new or empty. Wall time is recorded with 4 decimals and peak
/// RSS with 2, which is plenty for cross-tool comparison.
///
/// # Errors
/// Returns an error if the file cannot be created, opened, or written.
pub fn append_result(path: &Path, row: &ResultRow) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }

    let write_header = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(f);

    if write_header {
        wtr.write_record(RESULTS_HEADER)
            .with_context(|| format!("write header to {}", path.display()))?;
    }
    let rows = row.rows.to_string();
    let wall_time = format!("{:.4}", row.wall_time_s);
    let peak_rss = row
        .peak_rss_mb
        .map_or(String::new(), |mb| format!("{mb:.2}"));
    let accepted = row.accepted_rows.to_string();
    let rejected = row.rejected_rows.to_string();
    wtr.write_record([
        row.tool.as_str(),
        row.dataset.as_str(),
        rows.as_str(),
        wall_time.as_str(),
        peak_rss.as_str(),
        accepted.as_str(),
        rejected.as_str(),
        row.notes.as_str(),
    ])
    .with_context(|| format!("append result to {}", path.display()))?;
    wtr.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}
