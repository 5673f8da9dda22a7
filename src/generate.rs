//! Synthetic benchmark inputs: cyclic replay of a seed CSV with
//! deterministic fault injection.
//!
//! The generator emits exactly `rows` rows under the pipeline header.
//! `row_id` is sequential from 1; the remaining fields cycle through the
//! seed file's rows, re-reading it from the start whenever it runs out, so
//! the seed is never buffered whole. Every row whose 1-based position is
//! an exact multiple of `invalid_every` gets an empty `pickup_datetime`,
//! the one fault the validator is benchmarked against.

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use crate::record::HEADER;

/// Seed columns are resolved by header name. Raw trip exports use their
/// own spellings, so each pipeline column accepts an alias list.
const PICKUP_NAMES: [&str; 2] = ["pickup_datetime", "Date/Time"];
const LAT_NAMES: [&str; 2] = ["lat", "Lat"];
const LON_NAMES: [&str; 2] = ["lon", "Lon"];
const BASE_NAMES: [&str; 2] = ["base", "Base"];

/// Human label for a row count: `100_000 → "100k"`, `5_000_000 → "5m"`.
#[must_use]
pub fn label_for_rows(rows: u64) -> String {
    if rows >= 1_000_000 {
        format!("{}m", rows / 1_000_000)
    } else {
        format!("{}k", rows / 1_000)
    }
}

/// Conventional path for a generated input: `<dir>/<dataset>_<label>.csv`.
pub fn generated_path(dir: &Path, dataset: &str, rows: u64) -> PathBuf {
    dir.join(format!("{dataset}_{}.csv", label_for_rows(rows)))
}

struct SeedColumns {
    pickup: usize,
    lat: Option<usize>,
    lon: Option<usize>,
    base: Option<usize>,
}

impl SeedColumns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim() == *n))
        };
        let Some(pickup) = find(&PICKUP_NAMES) else {
            bail!("seed is missing a pickup datetime column (one of {PICKUP_NAMES:?})");
        };
        Ok(Self {
            pickup,
            lat: find(&LAT_NAMES),
            lon: find(&LON_NAMES),
            base: find(&BASE_NAMES),
        })
    }
}

/// Re-reads the seed file from the start each time it is exhausted.
struct SeedCycle {
    path: PathBuf,
    columns: SeedColumns,
    reader: csv::Reader<File>,
}

impl SeedCycle {
    fn open(path: &Path) -> Result<Self> {
        let mut reader = open_seed(path)?;
        let columns = SeedColumns::resolve(
            reader
                .headers()
                .with_context(|| format!("read seed header {}", path.display()))?,
        )?;
        // An empty seed cannot be cycled; fail up front instead of looping.
        let mut probe = StringRecord::new();
        if !reader
            .read_record(&mut probe)
            .with_context(|| format!("read seed {}", path.display()))?
        {
            bail!("seed {} has no data rows", path.display());
        }
        let reader = open_seed(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            columns,
            reader,
        })
    }

    fn next_row(&mut self) -> Result<StringRecord> {
        let mut row = StringRecord::new();
        let more = self
            .reader
            .read_record(&mut row)
            .with_context(|| format!("read seed {}", self.path.display()))?;
        if more {
            return Ok(row);
        }
        self.reader = open_seed(&self.path)?;
        let more = self
            .reader
            .read_record(&mut row)
            .with_context(|| format!("re-read seed {}", self.path.display()))?;
        if !more {
            // Guarded at open, but the file can change underneath us.
            bail!("seed {} has no data rows", self.path.display());
        }
        Ok(row)
    }
}

fn open_seed(path: &Path) -> Result<csv::Reader<File>> {
    let f = File::open(path).with_context(|| format!("open seed {}", path.display()))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(f))
}

/// Generate one benchmark input of exactly `rows` rows.
///
/// `invalid_every = 0` disables fault injection. Returns the number of
/// rows written.
///
/// # Errors
/// Returns an error if the seed cannot be read (or has no data rows) or
/// the output cannot be written.
pub fn generate_file(
    seed: &Path,
    out: &Path,
    rows: u64,
    invalid_every: u64,
) -> Result<u64> {
    let mut cycle = SeedCycle::open(seed)?;

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(out).with_context(|| format!("create {}", out.display()))?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(f);
    wtr.write_record(HEADER).context("write header")?;

    for idx in 1..=rows {
        let seed_row = cycle.next_row()?;
        let columns = &cycle.columns;
        let get = |col: Option<usize>| col.and_then(|c| seed_row.get(c)).unwrap_or("");

        let pickup = if invalid_every > 0 && idx % invalid_every == 0 {
            ""
        } else {
            seed_row.get(columns.pickup).unwrap_or("")
        };

        let row_id = idx.to_string();
        wtr.write_record([
            row_id.as_str(),
            pickup,
            get(columns.lat),
            get(columns.lon),
            get(columns.base),
        ])
        .with_context(|| format!("write row {idx} to {}", out.display()))?;
    }

    wtr.flush()
        .with_context(|| format!("flush {}", out.display()))?;
    Ok(rows)
}
