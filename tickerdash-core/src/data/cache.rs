//! Per-query CSV cache.
//!
//! One file per (ticker, start, end) key: `{TICKER}_{start}_{end}.csv` with a
//! header row and an ISO `Date` column. Entries are overwritten wholesale —
//! never merged or appended — and writes go to a `.tmp` file then rename into
//! place. The cache never expires entries; staleness is handled out of band.

use super::provider::DataError;
use super::table::PriceTable;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a cache lookup. Damaged entries are reported rather than
/// hidden, so the caller decides the fallback (the orchestrator logs and
/// refetches).
#[derive(Debug)]
pub enum CacheRead {
    Hit(PriceTable),
    Miss,
    Damaged(String),
}

/// CSV-file cache keyed by (ticker, start, end). The root directory is an
/// explicit constructor argument and is provisioned lazily on first save.
pub struct CsvCache {
    cache_dir: PathBuf,
}

impl CsvCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Storage path for a key: the ticker uppercased with embedded whitespace
    /// removed, joined with the ISO date bounds. Distinct (ticker, start, end)
    /// triples map to distinct files.
    pub fn entry_path(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        let ticker: String = ticker
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        self.cache_dir.join(format!("{ticker}_{start}_{end}.csv"))
    }

    /// Look up a cached table. A missing file is `Miss`; an unreadable or
    /// malformed file is `Damaged` with the reason.
    pub fn load(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> CacheRead {
        let path = self.entry_path(ticker, start, end);
        if !path.exists() {
            return CacheRead::Miss;
        }
        match read_entry(&path) {
            Ok(table) => CacheRead::Hit(table),
            Err(e) => CacheRead::Damaged(format!("{}: {e}", path.display())),
        }
    }

    /// Serialize the full table, overwriting any existing entry at the key.
    pub fn save(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        table: &PriceTable,
    ) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create cache dir: {e}")))?;

        let path = self.entry_path(ticker, start, end);
        let tmp_path = path.with_extension("csv.tmp");
        if let Err(e) = write_entry(table, &tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })
    }
}

fn write_entry(table: &PriceTable, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path)
        .map_err(|e| DataError::CacheError(format!("create file: {e}")))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut table.frame().clone())
        .map_err(|e| DataError::CacheError(format!("write csv: {e}")))
}

fn read_entry(path: &Path) -> Result<PriceTable, DataError> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| DataError::CacheError(format!("open csv: {e}")))?
        .finish()
        .map_err(|e| DataError::CacheError(format!("read csv: {e}")))?;

    // The reader may infer Date as a string or datetime depending on content;
    // normalize before validating the table invariant.
    let frame = frame
        .lazy()
        .with_column(col("Date").cast(DataType::Date))
        .collect()
        .map_err(|e| DataError::CacheError(format!("Date column: {e}")))?;

    PriceTable::from_frame(frame)
}
