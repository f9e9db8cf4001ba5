//! Indicator computations over a cleaned price table.
//!
//! Indicators are pure, stateless functions returning a series positionally
//! aligned 1:1 with the table's rows; `f64::NAN` marks entries where there is
//! insufficient history. They never mutate the source table.

pub mod rsi;
pub mod sma;

pub use rsi::rsi;
pub use sma::moving_average;

/// A series aligned 1:1 with a `PriceTable`'s rows. NaN means undefined.
pub type IndicatorSeries = Vec<f64>;

/// Build a table with a `Close` column from raw closes, dated from 2024-01-02.
#[cfg(test)]
pub fn make_table(closes: &[f64]) -> crate::data::PriceTable {
    use polars::prelude::*;

    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let days: Vec<i32> = (0..closes.len())
        .map(|i| ((base + chrono::Duration::days(i as i64)) - epoch).num_days() as i32)
        .collect();
    let frame = DataFrame::new(vec![
        Column::new("Date".into(), days).cast(&DataType::Date).unwrap(),
        Column::new("Close".into(), closes.to_vec()),
    ])
    .unwrap();
    crate::data::PriceTable::from_frame(frame).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
