//! Fetch, clean, cache, and orchestration.

pub mod cache;
pub mod clean;
pub mod pipeline;
pub mod provider;
pub mod raw;
pub mod table;
pub mod yahoo;

pub use cache::{CacheRead, CsvCache};
pub use clean::clean;
pub use pipeline::Pipeline;
pub use provider::{DataError, FillMethod, Interval, MarketDataProvider};
pub use raw::{ColumnLabel, RawColumn, RawIndex, RawTable, RawValue};
pub use table::PriceTable;
pub use yahoo::YahooProvider;
