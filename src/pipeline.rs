//! The single-pass ingestion pipeline: read → validate → dedup → split.
//!
//! Each incoming row is parsed into an [`IngestionRecord`], validated,
//! checked against the run's [`KeyTracker`], and appended (original raw
//! fields, arrival order preserved) to exactly one of the two output
//! partitions. The pass holds O(1) full records at any instant; only the
//! dedup key set grows with input size.
//!
//! # Failure policy
//! A malformed row is a classification, not an error: it lands in the
//! rejected partition and the run continues. An unreadable source or a
//! sink that stops accepting writes is fatal: the error propagates, no
//! summary is produced, and a failed run cannot masquerade as a complete
//! one.

use crate::dedup::KeyTracker;
use crate::record::IngestionRecord;
use crate::rusage;
use crate::validation::Validate;
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use std::fs::{File, create_dir_all};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Where a row lands. Every row is routed to exactly one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Accepted,
    Rejected,
}

/// Counters and timing for one completed run. Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_rows: u64,
    pub accepted_rows: u64,
    pub rejected_rows: u64,
    /// Rejected for a validity defect (missing/unparsable gating field).
    pub invalid_rows: u64,
    /// Valid rows rejected because their key had already been observed.
    pub duplicate_rows: u64,
    pub distinct_keys: u64,
    pub wall_time_s: f64,
    pub peak_rss_mb: Option<f64>,
}

impl RunSummary {
    fn empty() -> Self {
        Self {
            total_rows: 0,
            accepted_rows: 0,
            rejected_rows: 0,
            invalid_rows: 0,
            duplicate_rows: 0,
            distinct_keys: 0,
            wall_time_s: 0.0,
            peak_rss_mb: None,
        }
    }
}

/// Split an input stream into accepted/rejected partitions.
///
/// The input header is replicated to both outputs. Rows are processed in
/// strict arrival order and each partition preserves that order. Timing
/// and memory fields of the returned summary are left unset; use
/// [`run_file`] for a stamped end-to-end run.
///
/// # Errors
/// Returns an error on a source read failure or a sink write failure; no
/// summary is returned for a partial run.
pub fn split_stream<R: Read, A: Write, B: Write>(
    input: R,
    accepted: A,
    rejected: B,
) -> Result<RunSummary> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    // Flexible writers: a ragged input row is passed through as-is rather
    // than turning a row-level defect into a sink error.
    let mut acc = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(accepted);
    let mut rej = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(rejected);

    // An entirely empty source has no header to replicate; that is still a
    // zero-row success.
    let header = rdr.headers().context("read input header")?.clone();
    if header.len() > 0 {
        acc.write_record(&header).context("write accepted header")?;
        rej.write_record(&header).context("write rejected header")?;
    }

    let mut summary = RunSummary::empty();
    let mut keys = KeyTracker::new();
    let mut raw = ByteRecord::new();

    loop {
        let more = rdr
            .read_byte_record(&mut raw)
            .with_context(|| format!("read input row {}", summary.total_rows + 1))?;
        if !more {
            break;
        }
        // Lossy conversion keeps a garbled row as a row-level defect
        // instead of aborting the run.
        let record = IngestionRecord::from_raw(StringRecord::from_byte_record_lossy(raw.clone()));
        let is_valid = record.validate().is_ok();
        // Keys register regardless of validity: an invalid first occurrence
        // still consumes the key, and a later valid copy is a duplicate.
        let is_first = keys.observe(record.row_id);

        summary.total_rows += 1;
        let class = if is_valid && is_first {
            RowClass::Accepted
        } else {
            RowClass::Rejected
        };
        match class {
            RowClass::Accepted => {
                summary.accepted_rows += 1;
                acc.write_record(record.raw())
                    .with_context(|| format!("write accepted row {}", summary.total_rows))?;
            }
            RowClass::Rejected => {
                summary.rejected_rows += 1;
                if !is_valid {
                    summary.invalid_rows += 1;
                } else {
                    summary.duplicate_rows += 1;
                }
                rej.write_record(record.raw())
                    .with_context(|| format!("write rejected row {}", summary.total_rows))?;
            }
        }
    }

    acc.flush().context("flush accepted partition")?;
    rej.flush().context("flush rejected partition")?;

    summary.distinct_keys = keys.distinct_keys() as u64;
    Ok(summary)
}

/// Run the pipeline over files, stamping wall time and peak RSS.
///
/// Parent directories for both partitions are created as needed.
///
/// # Errors
/// Returns an error if the input cannot be opened or either partition
/// cannot be created or written.
pub fn run_file(
    input: impl AsRef<Path>,
    accepted: impl AsRef<Path>,
    rejected: impl AsRef<Path>,
) -> Result<RunSummary> {
    let input = input.as_ref();
    let start = Instant::now();

    let source = File::open(input).with_context(|| format!("open {}", input.display()))?;
    let acc = create_partition(accepted.as_ref())?;
    let rej = create_partition(rejected.as_ref())?;

    let mut summary = split_stream(source, acc, rej)?;
    summary.wall_time_s = start.elapsed().as_secs_f64();
    summary.peak_rss_mb = rusage::peak_rss_self_mb();

    info!(
        total = summary.total_rows,
        accepted = summary.accepted_rows,
        rejected = summary.rejected_rows,
        invalid = summary.invalid_rows,
        duplicates = summary.duplicate_rows,
        wall_time_s = summary.wall_time_s,
        "pipeline run complete"
    );
    Ok(summary)
}

fn create_partition(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("create {}", path.display()))
}
