//! Property tests for the cleaner and the indicator engine.

use chrono::NaiveDate;
use polars::prelude::*;
use proptest::prelude::*;
use tickerdash_core::data::{
    clean, ColumnLabel, FillMethod, PriceTable, RawColumn, RawTable, RawValue,
};
use tickerdash_core::indicators::{moving_average, rsi};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Raw table with a `Date` column at `base + offset` days and a `Close`
/// column; offsets may collide and arrive in any order.
fn raw_from_rows(rows: &[(u16, f64)]) -> RawTable {
    RawTable {
        index: None,
        columns: vec![
            RawColumn {
                label: ColumnLabel::Plain("Date".to_string()),
                values: rows
                    .iter()
                    .map(|(off, _)| {
                        RawValue::Date(base_date() + chrono::Duration::days(*off as i64))
                    })
                    .collect(),
            },
            RawColumn {
                label: ColumnLabel::Plain("Close".to_string()),
                values: rows.iter().map(|(_, v)| RawValue::Number(*v)).collect(),
            },
        ],
    }
}

fn price_table(closes: &[f64]) -> PriceTable {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let days: Vec<i32> = (0..closes.len())
        .map(|i| ((base_date() + chrono::Duration::days(i as i64)) - epoch).num_days() as i32)
        .collect();
    let frame = DataFrame::new(vec![
        Column::new("Date".into(), days).cast(&DataType::Date).unwrap(),
        Column::new("Close".into(), closes.to_vec()),
    ])
    .unwrap();
    PriceTable::from_frame(frame).unwrap()
}

proptest! {
    #[test]
    fn cleaner_dates_are_strictly_increasing_and_in_range(
        rows in proptest::collection::vec((0u16..120, -1000.0f64..1000.0), 0..60),
        start_off in 0i64..60,
        span in 0i64..60,
    ) {
        let start = base_date() + chrono::Duration::days(start_off);
        let end = start + chrono::Duration::days(span);
        let table = clean(&raw_from_rows(&rows), start, end, FillMethod::Forward).unwrap();

        let dates = table.dates().unwrap();
        for w in dates.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
        for d in &dates {
            prop_assert!(*d >= start && *d <= end);
        }
    }

    #[test]
    fn cleaning_twice_equals_cleaning_once(
        rows in proptest::collection::vec((0u16..120, -1000.0f64..1000.0), 0..60),
    ) {
        let start = base_date();
        let end = base_date() + chrono::Duration::days(120);
        let once = clean(&raw_from_rows(&rows), start, end, FillMethod::Forward).unwrap();

        let canonical: Vec<(u16, f64)> = once
            .dates()
            .unwrap()
            .into_iter()
            .zip(once.column_f64("Close").unwrap())
            .map(|(d, v)| ((d - base_date()).num_days() as u16, v))
            .collect();
        let twice = clean(&raw_from_rows(&canonical), start, end, FillMethod::Forward).unwrap();

        prop_assert_eq!(once.frame(), twice.frame());
    }

    #[test]
    fn rsi_defined_values_are_bounded(
        closes in proptest::collection::vec(1.0f64..1000.0, 2..60),
        period in 1usize..30,
    ) {
        let table = price_table(&closes);
        let result = rsi(&table, period, None).unwrap();

        prop_assert_eq!(result.len(), closes.len());
        prop_assert!(result[0].is_nan());
        for v in &result[1..] {
            prop_assert!(!v.is_nan());
            prop_assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn moving_average_boundary(
        closes in proptest::collection::vec(1.0f64..1000.0, 0..60),
        window in 1usize..20,
    ) {
        let table = price_table(&closes);
        let result = moving_average(&table, window, None).unwrap();
        let n = closes.len();

        prop_assert_eq!(result.len(), n);
        if n < window {
            prop_assert!(result.iter().all(|v| v.is_nan()));
        } else {
            prop_assert!(result[..window - 1].iter().all(|v| v.is_nan()));
            for (i, v) in result.iter().enumerate().skip(window - 1) {
                prop_assert!(v.is_finite());
                let expected: f64 =
                    closes[(i + 1 - window)..=i].iter().sum::<f64>() / window as f64;
                prop_assert!((v - expected).abs() < 1e-9);
            }
        }
    }
}
