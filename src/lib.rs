//! # Weir
//!
//! A **streaming CSV ingestion gate**: one sequential pass over a
//! fixed-schema row stream that validates each row, suppresses duplicate
//! keys (first occurrence wins), and splits the stream into `accepted`
//! and `rejected` partitions. The crate also ships the benchmark harness
//! that exercises the gate under synthetic load and records comparable
//! results.
//!
//! ## Key Properties
//!
//! - **Single pass, arrival order** - rows are classified in the order
//!   they arrive; both output partitions preserve that order
//! - **Streaming memory bounds** - O(1) full records held at any instant;
//!   only the dedup key set grows with input size
//! - **Row defects are data, not errors** - a malformed row is routed to
//!   the rejected partition and the run continues
//! - **Honest failure** - an unreadable source or a failing sink aborts
//!   the run with a non-zero exit; a partial run never reports a summary
//!
//! ## Quick Start
//!
//! ```no_run
//! use weir::run_file;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let summary = run_file("trips.csv", "out/accepted.csv", "out/rejected.csv")?;
//! assert_eq!(
//!     summary.accepted_rows + summary.rejected_rows,
//!     summary.total_rows
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## The Gate
//!
//! The input schema is fixed: `row_id,pickup_datetime,lat,lon,base`.
//! A row is **accepted** iff
//!
//! 1. `row_id` is present and parses as an integer,
//! 2. `pickup_datetime` is present and parses as `M/d/yyyy H:mm:ss`, and
//! 3. it is the earliest-arriving row bearing that `row_id`.
//!
//! Everything else is **rejected**. `lat`, `lon`, and `base` are carried
//! through untouched and never gate acceptance. Keys register on first
//! sight regardless of validity, so a valid copy arriving after an
//! invalid original is still a duplicate.
//!
//! ## The Harness
//!
//! The `weir` binary wraps the gate in a benchmark loop:
//!
//! - [`generate`] - cycle a seed CSV into inputs of exact row counts,
//!   blanking `pickup_datetime` at a fixed stride
//! - [`pipeline`] - the gate itself ([`run_file`] / [`split_stream`])
//! - [`report`] - append one flat result row per run to a results CSV
//! - [`rusage`] - peak-RSS sampling and child-command timing
//!
//! ## Module Overview
//!
//! - [`record`] - the 5-column row model and tolerant field parsing
//! - [`validation`] - the validity rule and per-field failure reasons
//! - [`dedup`] - first-occurrence tracking over the key stream
//! - [`pipeline`] - the single-pass runner and its [`RunSummary`]
//! - [`generate`] - synthetic input generation
//! - [`report`] - benchmark result bookkeeping
//! - [`rusage`] - `getrusage`-based resource sampling

pub mod dedup;
pub mod generate;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod rusage;
pub mod validation;

pub use dedup::KeyTracker;
pub use generate::{generate_file, generated_path, label_for_rows};
pub use pipeline::{RowClass, RunSummary, run_file, split_stream};
pub use record::{HEADER, IngestionRecord, PICKUP_DATETIME_FORMAT};
pub use report::{RESULTS_HEADER, ResultRow, append_result};
pub use rusage::{CommandTiming, time_command};
pub use validation::{Validate, ValidationError, ValidationResult};
