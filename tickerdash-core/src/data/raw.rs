//! Untyped provider output.
//!
//! Providers hand back loosely-typed tables: column labels may be composite
//! (field tagged with the ticker), dates may live in a positional index
//! rather than a named column, and cells may be missing. `RawTable` models
//! that shape so the cleaner can normalize it into a `PriceTable`.

use chrono::NaiveDate;

/// A column label as delivered by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnLabel {
    /// Single-part name, e.g. `Close`.
    Plain(String),
    /// Multi-part name, e.g. `("Close", "AAPL")`.
    Composite(Vec<String>),
}

/// One cell of a raw table.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl RawValue {
    /// Numeric view of the cell. Text is parsed; dates and nulls are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Calendar-date view of the cell. Text is parsed as an ISO date or datetime.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawValue::Date(d) => Some(*d),
            RawValue::Text(s) => parse_date(s.trim()),
            _ => None,
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// One labeled column of cells.
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub label: ColumnLabel,
    pub values: Vec<RawValue>,
}

/// Positional index of a raw table (providers often return dates here
/// instead of in a named column).
#[derive(Debug, Clone)]
pub struct RawIndex {
    pub name: Option<String>,
    pub values: Vec<RawValue>,
}

/// A raw tabular result from a provider. May be empty — that is the valid
/// no-data outcome, not an error.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub index: Option<RawIndex>,
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn height(&self) -> usize {
        self.columns
            .first()
            .map(|c| c.values.len())
            .or_else(|| self.index.as_ref().map(|ix| ix.values.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    /// Fetcher-side label normalization: a composite label collapses to its
    /// first component, then a trailing `_{TICKER}` tag (appended by some
    /// providers) is stripped. Case-insensitive on the tag.
    pub fn flatten_field_labels(&mut self, ticker: &str) {
        let suffix = format!("_{}", ticker.trim().to_uppercase());
        for column in &mut self.columns {
            let name = match &column.label {
                ColumnLabel::Plain(name) => name.clone(),
                ColumnLabel::Composite(parts) => parts.first().cloned().unwrap_or_default(),
            };
            let name = if name.to_uppercase().ends_with(&suffix) && name.len() > suffix.len() {
                name[..name.len() - suffix.len()].to_string()
            } else {
                name
            };
            column.label = ColumnLabel::Plain(name);
        }
    }
}
