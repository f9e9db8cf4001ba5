//! Relative Strength Index.
//!
//! Per-row price changes are split into gains and losses, each smoothed with
//! an EWMA (alpha = 1/period) seeded directly from the first valid change —
//! no Wilder warm-up average. The first entry has no change and is undefined;
//! undefined values at the head of the column defer seeding rather than
//! poisoning the whole series, while a hole after seeding leaves every later
//! value undefined.
//!
//! Divide-by-zero policy: `avg_loss == 0` reports RSI = 100, including the
//! flat-series case, never NaN or a division error.

use super::sma::resolve_column;
use super::IndicatorSeries;
use crate::data::{DataError, PriceTable};

/// RSI over a price column, values in [0, 100]. `column: None` uses the
/// table's price column.
pub fn rsi(
    table: &PriceTable,
    period: usize,
    column: Option<&str>,
) -> Result<IndicatorSeries, DataError> {
    if period == 0 {
        return Err(DataError::InvalidParameter(
            "RSI period must be a positive integer".to_string(),
        ));
    }

    let values = resolve_column(table, column)?;
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < 2 {
        return Ok(result);
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = f64::NAN;
    let mut avg_loss = f64::NAN;

    for i in 1..n {
        let delta = values[i] - values[i - 1];
        if delta.is_nan() {
            if avg_gain.is_nan() {
                // Leading hole: no valid change to seed from yet.
                continue;
            }
            // A hole after seeding invalidates every later smoothed value.
            break;
        }

        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        if avg_gain.is_nan() {
            // Seeded from the first change.
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        }

        result[i] = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }

    Ok(result)
}
