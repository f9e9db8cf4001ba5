//! The canonical cleaned price table.

use super::provider::DataError;
use chrono::NaiveDate;
use polars::prelude::*;

/// Column names a cleaned table may carry, in canonical order.
pub const CANONICAL_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// A cleaned OHLCV table: a `Date` column of strictly increasing, unique
/// calendar dates plus zero or more numeric price/volume columns.
///
/// Produced by the cleaner (or read back from the cache) and immutable
/// afterwards; indicators and renderers only ever borrow it.
#[derive(Debug, Clone)]
pub struct PriceTable {
    frame: DataFrame,
}

impl PriceTable {
    /// Wrap a frame, enforcing the `Date` invariant.
    pub fn from_frame(frame: DataFrame) -> Result<Self, DataError> {
        let dates = date_column(&frame)?;
        for w in dates.windows(2) {
            if w[0] >= w[1] {
                return Err(DataError::TableError(format!(
                    "Date column is not strictly increasing: {} then {}",
                    w[0], w[1]
                )));
            }
        }
        Ok(Self { frame })
    }

    /// Empty table with the canonical column set.
    pub fn empty() -> Self {
        let date = Column::new("Date".into(), Vec::<i32>::new())
            .cast(&DataType::Date)
            .expect("casting an empty Int32 column to Date cannot fail");
        let mut columns = vec![date];
        for name in &CANONICAL_COLUMNS[1..] {
            columns.push(Column::new((*name).into(), Vec::<f64>::new()));
        }
        let frame = DataFrame::new(columns)
            .expect("canonical empty frame has unique column names");
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Dates in row order.
    pub fn dates(&self) -> Result<Vec<NaiveDate>, DataError> {
        date_column(&self.frame)
    }

    /// A column's values as f64, nulls as NaN, aligned with the rows.
    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>, DataError> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| DataError::TableError(format!("missing column '{name}'")))?
            .cast(&DataType::Float64)?;
        let ca = column.f64()?;
        Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// The price column the indicators operate on: `Close`, falling back to
    /// `Adj Close`, then to any column whose name contains `Close`.
    pub fn price_column(&self) -> Result<String, DataError> {
        let names: Vec<String> = self
            .frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if names.iter().any(|n| n == "Close") {
            return Ok("Close".to_string());
        }
        if names.iter().any(|n| n == "Adj Close") {
            return Ok("Adj Close".to_string());
        }
        if let Some(name) = names.iter().find(|n| n.contains("Close")) {
            return Ok(name.clone());
        }
        Err(DataError::MissingPriceColumn(names.join(", ")))
    }
}

pub(crate) fn date_column(frame: &DataFrame) -> Result<Vec<NaiveDate>, DataError> {
    let column = frame
        .column("Date")
        .map_err(|_| DataError::TableError("missing Date column".to_string()))?;
    let ca = column
        .date()
        .map_err(|e| DataError::TableError(format!("Date column type: {e}")))?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut dates = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        let days = ca
            .get(i)
            .ok_or_else(|| DataError::TableError(format!("null Date at row {i}")))?;
        dates.push(epoch + chrono::Duration::days(days as i64));
    }
    Ok(dates)
}
