//! Simple moving average.
//!
//! Trailing arithmetic mean of the `window` observations ending at each row.
//! The first `window - 1` entries are undefined; a table shorter than the
//! window yields an all-undefined series.

use super::IndicatorSeries;
use crate::data::{DataError, PriceTable};

/// Rolling mean of a price column. `column: None` uses the table's price
/// column (`Close`, then `Adj Close`, then any name containing `Close`).
pub fn moving_average(
    table: &PriceTable,
    window: usize,
    column: Option<&str>,
) -> Result<IndicatorSeries, DataError> {
    if window == 0 {
        return Err(DataError::InvalidParameter(
            "moving-average window must be a positive integer".to_string(),
        ));
    }

    let values = resolve_column(table, column)?;
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < window {
        return Ok(result);
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().sum::<f64>() / window as f64;
    }

    Ok(result)
}

/// Resolve the price column an indicator operates on. An explicit name must
/// exist; `None` walks the table's fallback chain.
pub(super) fn resolve_column(
    table: &PriceTable,
    column: Option<&str>,
) -> Result<Vec<f64>, DataError> {
    match column {
        Some(name) => {
            if table.frame().column(name).is_err() {
                return Err(DataError::MissingPriceColumn(name.to_string()));
            }
            table.column_f64(name)
        }
        None => {
            let name = table.price_column()?;
            table.column_f64(&name)
        }
    }
}
