//! Integration tests for the request pipeline with a mock provider.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickerdash_core::data::{
    clean, ColumnLabel, CsvCache, DataError, FillMethod, Interval, MarketDataProvider, Pipeline,
    RawColumn, RawIndex, RawTable, RawValue,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_cache_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir =
        std::env::temp_dir().join(format!("tickerdash_pipe_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn jan(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

/// Provider returning a fixed five-row table and counting download calls.
struct MockProvider {
    calls: Arc<AtomicUsize>,
    empty: bool,
}

impl MockProvider {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self { calls, empty: false }
    }

    fn empty(calls: Arc<AtomicUsize>) -> Self {
        Self { calls, empty: true }
    }
}

impl MarketDataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn download(
        &self,
        _ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
        _interval: Interval,
    ) -> Result<RawTable, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.empty {
            return Ok(RawTable::empty());
        }
        Ok(RawTable {
            index: Some(RawIndex {
                name: Some("Date".to_string()),
                values: (2..=6).map(|d| RawValue::Date(jan(d))).collect(),
            }),
            columns: vec![
                RawColumn {
                    label: ColumnLabel::Plain("Close".to_string()),
                    values: (0..5).map(|i| RawValue::Number(100.0 + i as f64)).collect(),
                },
                RawColumn {
                    label: ColumnLabel::Plain("Volume".to_string()),
                    values: (0..5).map(|i| RawValue::Number(1000.0 + i as f64)).collect(),
                },
            ],
        })
    }
}

fn pipeline_with(
    dir: &PathBuf,
    provider: MockProvider,
    memo_ttl: Duration,
) -> Pipeline {
    Pipeline::with_memo_ttl(Box::new(provider), CsvCache::new(dir), memo_ttl)
}

#[test]
fn miss_then_hit_fetches_exactly_once() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    // Zero TTL disables the memo so the second call exercises the disk cache.
    let pipeline = pipeline_with(&dir, MockProvider::new(calls.clone()), Duration::ZERO);

    let first = pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "hit must not refetch");

    assert_eq!(first.dates().unwrap(), second.dates().unwrap());
    assert_eq!(
        first.column_f64("Close").unwrap(),
        second.column_f64("Close").unwrap()
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_range_is_rejected_before_any_fetch() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(&dir, MockProvider::new(calls.clone()), Duration::ZERO);

    let result = pipeline.price_table("AAPL", jan(31), jan(1), Interval::Daily);
    assert!(matches!(result, Err(DataError::InvalidRange { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn memo_serves_repeat_requests_without_touching_disk() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(
        &dir,
        MockProvider::new(calls.clone()),
        Duration::from_secs(300),
    );

    pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    // Remove the disk tier entirely; the memo must still answer.
    std::fs::remove_dir_all(&dir).unwrap();

    let table = pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(table.height(), 5);
}

#[test]
fn distinct_requests_are_distinct_memo_keys() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(
        &dir,
        MockProvider::new(calls.clone()),
        Duration::from_secs(300),
    );

    pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Weekly)
        .unwrap();
    pipeline
        .price_table("MSFT", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn damaged_cache_entry_triggers_a_refetch() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(&dir, MockProvider::new(calls.clone()), Duration::ZERO);

    std::fs::create_dir_all(&dir).unwrap();
    let entry = pipeline.cache().entry_path("AAPL", jan(1), jan(31));
    std::fs::write(&entry, "not,a,price\ntable,at,all\n").unwrap();

    let table = pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(table.height(), 5);

    // The refetch overwrote the damaged entry; the next call is a clean hit.
    pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_cache_write_still_returns_the_cleaned_table() {
    let dir = temp_cache_dir();
    // A file where the cache root should be makes every save fail.
    std::fs::write(&dir, "not a directory").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(&dir, MockProvider::new(calls.clone()), Duration::ZERO);

    let table = pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(table.height(), 5);
    assert_eq!(table.dates().unwrap().first(), Some(&jan(2)));

    // Nothing was persisted, so the same request fetches again.
    pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let _ = std::fs::remove_file(&dir);
}

#[test]
fn empty_provider_result_is_an_empty_table_not_an_error() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(&dir, MockProvider::empty(calls), Duration::ZERO);

    let table = pipeline
        .price_table("NOPE", jan(1), jan(31), Interval::Daily)
        .unwrap();
    assert!(table.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn fetched_rows_outside_the_range_are_filtered() {
    // The mock returns Jan 2..6; asking for Jan 3..5 must clip.
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with(&dir, MockProvider::new(calls), Duration::ZERO);

    let table = pipeline
        .price_table("AAPL", jan(3), jan(5), Interval::Daily)
        .unwrap();
    assert_eq!(table.dates().unwrap(), vec![jan(3), jan(4), jan(5)]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cleaned_fetch_matches_a_direct_clean() {
    let dir = temp_cache_dir();
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = MockProvider::new(calls);
    let raw = provider
        .download("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();
    let direct = clean(&raw, jan(1), jan(31), FillMethod::Forward).unwrap();

    let pipeline = pipeline_with(&dir, provider, Duration::ZERO);
    let via_pipeline = pipeline
        .price_table("AAPL", jan(1), jan(31), Interval::Daily)
        .unwrap();

    assert_eq!(direct.frame(), via_pipeline.frame());

    let _ = std::fs::remove_dir_all(&dir);
}
