//! Provider trait and the shared error taxonomy.
//!
//! `MarketDataProvider` abstracts over data sources (Yahoo Finance, mocks in
//! tests) so the pipeline can swap implementations. The cache layer sits
//! above this trait — providers don't know about the cache.

use super::raw::RawTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
}

impl Interval {
    /// Interval code understood by the chart API.
    pub fn provider_code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_code())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "daily" | "d" => Ok(Interval::Daily),
            "1wk" | "weekly" | "w" => Ok(Interval::Weekly),
            other => Err(DataError::InvalidParameter(format!(
                "unknown interval '{other}' (expected 1d or 1wk)"
            ))),
        }
    }
}

/// Missing-value policy applied by the cleaner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillMethod {
    /// Propagate the last valid value forward into gaps.
    #[default]
    Forward,
    /// Propagate the next valid value backward into gaps.
    Backward,
    /// Remove any row with an undefined field.
    Drop,
}

impl FromStr for FillMethod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ffill" | "forward" => Ok(FillMethod::Forward),
            "bfill" | "backward" => Ok(FillMethod::Backward),
            "drop" => Ok(FillMethod::Drop),
            other => Err(DataError::InvalidParameter(format!(
                "unknown fill method '{other}' (expected ffill, bfill, or drop)"
            ))),
        }
    }
}

/// Structured errors for the pipeline.
///
/// Only `MissingPriceColumn` aborts a request that reached the indicators;
/// cache failures are recovered by the orchestrator, and a provider with no
/// data for the request returns an empty table rather than an error.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no recognizable price column; columns present: [{0}]")]
    MissingPriceColumn(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("table error: {0}")]
    TableError(String),
}

impl From<polars::error::PolarsError> for DataError {
    fn from(e: polars::error::PolarsError) -> Self {
        DataError::TableError(e.to_string())
    }
}

/// A source of raw OHLCV rows.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch raw rows for a ticker over a closed date range.
    ///
    /// Implementations normalize column labels per the fetcher contract
    /// (composite labels flattened, ticker suffixes stripped). An empty
    /// table means the provider has no data for the request — a valid
    /// terminal state, not an error.
    fn download(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<RawTable, DataError>;
}
