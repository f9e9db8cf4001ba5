//! Cache-aside orchestration: memo → disk cache → fetch → clean → cache write.

use super::cache::{CacheRead, CsvCache};
use super::clean::clean;
use super::provider::{DataError, FillMethod, Interval, MarketDataProvider};
use super::table::PriceTable;
use chrono::NaiveDate;
use log::warn;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default lifetime of an in-memory memo entry.
pub const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
}

/// The request pipeline: one `price_table` call per user interaction.
///
/// Two cache tiers sit in front of the provider: a per-session, time-bounded
/// memo and the durable per-query CSV cache. A disk hit is always trusted —
/// there is no invalidation; callers wanting fresh data use a different range
/// or clear the cache out of band.
pub struct Pipeline {
    provider: Box<dyn MarketDataProvider>,
    cache: CsvCache,
    memo: Mutex<HashMap<MemoKey, (Instant, PriceTable)>>,
    memo_ttl: Duration,
}

impl Pipeline {
    pub fn new(provider: Box<dyn MarketDataProvider>, cache: CsvCache) -> Self {
        Self::with_memo_ttl(provider, cache, DEFAULT_MEMO_TTL)
    }

    pub fn with_memo_ttl(
        provider: Box<dyn MarketDataProvider>,
        cache: CsvCache,
        memo_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            memo: Mutex::new(HashMap::new()),
            memo_ttl,
        }
    }

    pub fn cache(&self) -> &CsvCache {
        &self.cache
    }

    /// Produce the canonical table for a request.
    ///
    /// Rejects `start > end` before anything else. On a cache miss the flow
    /// is fetch → clean (forward fill) → cache write → return; cache damage
    /// and write failures are logged and recovered, never surfaced.
    pub fn price_table(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<PriceTable, DataError> {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }

        let key = MemoKey {
            ticker: ticker.to_string(),
            start,
            end,
            interval,
        };
        if let Some(table) = self.memo_get(&key) {
            return Ok(table);
        }

        match self.cache.load(ticker, start, end) {
            CacheRead::Hit(table) => {
                self.memo_put(&key, &table);
                return Ok(table);
            }
            CacheRead::Damaged(reason) => {
                warn!("cache entry unreadable, refetching: {reason}");
            }
            CacheRead::Miss => {}
        }

        let raw = self.provider.download(ticker, start, end, interval)?;
        let table = clean(&raw, start, end, FillMethod::Forward)?;

        // A failed write costs a future fetch, not this response.
        if let Err(e) = self.cache.save(ticker, start, end, &table) {
            warn!("cache write failed for {ticker}: {e}");
        }

        self.memo_put(&key, &table);
        Ok(table)
    }

    fn memo_get(&self, key: &MemoKey) -> Option<PriceTable> {
        let memo = self.memo.lock().unwrap();
        memo.get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.memo_ttl)
            .map(|(_, table)| table.clone())
    }

    fn memo_put(&self, key: &MemoKey, table: &PriceTable) {
        let mut memo = self.memo.lock().unwrap();
        memo.insert(key.clone(), (Instant::now(), table.clone()));
    }
}
