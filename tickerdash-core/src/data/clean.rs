//! Raw-table cleaning: normalize → sort → dedup → filter → fill.

use super::provider::{DataError, FillMethod};
use super::raw::{ColumnLabel, RawColumn, RawTable, RawValue};
use super::table::PriceTable;
use chrono::NaiveDate;
use polars::prelude::*;

/// Normalize a raw provider table into a canonical `PriceTable`.
///
/// Steps, in order:
/// 1. column-name normalization (composite labels joined with `_`, falling
///    back to `unknown`; plain labels trimmed);
/// 2. `Date` materialization from the positional index (or the first column)
///    when no `Date` column exists;
/// 3. date parsing — rows whose date fails to parse are dropped;
/// 4. ascending sort by `Date`;
/// 5. duplicate dates dropped, first occurrence after the sort kept;
/// 6. filter to the closed interval `[start, end]`;
/// 7. missing-value policy per `fill`.
///
/// Pure transformation: an empty raw table cleans to the canonical empty
/// table, and cleaning an already-canonical table is a no-op.
pub fn clean(
    raw: &RawTable,
    start: NaiveDate,
    end: NaiveDate,
    fill: FillMethod,
) -> Result<PriceTable, DataError> {
    if raw.is_empty() {
        return Ok(PriceTable::empty());
    }

    // Step 1: normalize every column label to a plain name.
    let names: Vec<String> = raw.columns.iter().map(|c| normalize_label(&c.label)).collect();

    // Step 2: pick the date source. An existing `Date` column wins; otherwise
    // the positional index becomes the `Date` column (named or not); a table
    // with neither treats its first column as the date source.
    let date_values: &[RawValue];
    let mut value_columns: Vec<(&str, &RawColumn)> = Vec::new();

    if let Some(pos) = names.iter().position(|n| n == "Date") {
        date_values = &raw.columns[pos].values;
        for (i, column) in raw.columns.iter().enumerate() {
            if i != pos {
                value_columns.push((names[i].as_str(), column));
            }
        }
    } else if let Some(index) = &raw.index {
        date_values = &index.values;
        for (i, column) in raw.columns.iter().enumerate() {
            value_columns.push((names[i].as_str(), column));
        }
    } else {
        date_values = &raw.columns[0].values;
        for (i, column) in raw.columns.iter().enumerate().skip(1) {
            value_columns.push((names[i].as_str(), column));
        }
    }

    // Step 3: parse dates, dropping rows without a valid one.
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut surviving: Vec<(i32, usize)> = Vec::with_capacity(date_values.len());
    for (row, value) in date_values.iter().enumerate() {
        if let Some(date) = value.as_date() {
            surviving.push(((date - epoch).num_days() as i32, row));
        }
    }

    let days: Vec<i32> = surviving.iter().map(|(d, _)| *d).collect();
    let mut columns = vec![Column::new("Date".into(), days).cast(&DataType::Date)?];
    for (name, column) in &value_columns {
        let values: Vec<Option<f64>> = surviving
            .iter()
            .map(|(_, row)| column.values.get(*row).and_then(RawValue::as_number))
            .collect();
        columns.push(Column::new((*name).into(), values));
    }
    let frame = DataFrame::new(columns)?;

    // Steps 4-6: stable sort, keep-first dedup, closed-interval filter.
    let start_days = (start - epoch).num_days() as i32;
    let end_days = (end - epoch).num_days() as i32;
    let frame = frame
        .lazy()
        .sort(
            ["Date"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(Some(vec!["Date".into()]), UniqueKeepStrategy::First)
        .filter(
            col("Date")
                .cast(DataType::Int32)
                .gt_eq(lit(start_days))
                .and(col("Date").cast(DataType::Int32).lt_eq(lit(end_days))),
        )
        .collect()?;

    // Step 7: missing-value policy.
    let frame = match fill {
        FillMethod::Forward => frame.fill_null(FillNullStrategy::Forward(None))?,
        FillMethod::Backward => frame.fill_null(FillNullStrategy::Backward(None))?,
        FillMethod::Drop => frame.drop_nulls::<String>(None)?,
    };

    PriceTable::from_frame(frame)
}

fn normalize_label(label: &ColumnLabel) -> String {
    match label {
        ColumnLabel::Plain(name) => name.trim().to_string(),
        ColumnLabel::Composite(parts) => {
            let parts: Vec<&str> = parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.is_empty() {
                "unknown".to_string()
            } else {
                parts.join("_")
            }
        }
    }
}
