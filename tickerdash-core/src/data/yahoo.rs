//! Yahoo Finance data provider.
//!
//! Fetches OHLCV rows from Yahoo's v8 chart API with bounded retry and
//! exponential backoff. Yahoo has no official API and is subject to
//! unannounced format changes; the response structs below pin the parts we
//! rely on.
//!
//! A symbol or range Yahoo knows nothing about comes back as the empty raw
//! table — the pipeline's valid no-data outcome — never as an error.

use super::provider::{DataError, Interval, MarketDataProvider};
use super::raw::{ColumnLabel, RawColumn, RawIndex, RawTable, RawValue};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Build the chart API URL for a ticker, date range, and interval.
    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate, interval: Interval) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_ts = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval={}\
             &includeAdjustedClose=true",
            interval.provider_code()
        )
    }

    /// Parse the chart response into a raw table with a date index and
    /// composite `(field, TICKER)` column labels.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<RawTable, DataError> {
        let result = match resp.chart.result {
            Some(result) => result,
            None => {
                return match resp.chart.error {
                    Some(err) if err.code == "Not Found" => Ok(RawTable::empty()),
                    Some(err) => Err(DataError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    ))),
                    None => Err(DataError::ResponseFormatChanged(
                        "empty result with no error".to_string(),
                    )),
                };
            }
        };

        let data = result.into_iter().next().ok_or_else(|| {
            DataError::ResponseFormatChanged("result array is empty".to_string())
        })?;

        // No timestamps means no rows in the requested range.
        let timestamps = match data.timestamp {
            Some(timestamps) => timestamps,
            None => return Ok(RawTable::empty()),
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".to_string()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let n = timestamps.len();
        let mut dates = Vec::with_capacity(n);
        let mut open = Vec::with_capacity(n);
        let mut high = Vec::with_capacity(n);
        let mut low = Vec::with_capacity(n);
        let mut close = Vec::with_capacity(n);
        let mut volume = Vec::with_capacity(n);
        let mut adj_close = Vec::with_capacity(n);

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let o = quote.open.get(i).copied().flatten();
            let h = quote.high.get(i).copied().flatten();
            let l = quote.low.get(i).copied().flatten();
            let c = quote.close.get(i).copied().flatten();
            let v = quote.volume.get(i).copied().flatten();
            let a = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

            // Skip rows where all OHLCV are missing (holidays/non-trading days).
            if o.is_none() && h.is_none() && l.is_none() && c.is_none() && v.is_none() {
                continue;
            }

            dates.push(RawValue::Date(date));
            open.push(number_or_null(o));
            high.push(number_or_null(h));
            low.push(number_or_null(l));
            close.push(number_or_null(c));
            volume.push(number_or_null(v.map(|x| x as f64)));
            adj_close.push(number_or_null(a));
        }

        if dates.is_empty() {
            return Ok(RawTable::empty());
        }

        let tag = ticker.to_uppercase();
        let composite = |field: &str, values: Vec<RawValue>| RawColumn {
            label: ColumnLabel::Composite(vec![field.to_string(), tag.clone()]),
            values,
        };

        let mut columns = vec![
            composite("Open", open),
            composite("High", high),
            composite("Low", low),
            composite("Close", close),
            composite("Volume", volume),
        ];
        if adj_closes.is_some() {
            columns.push(composite("Adj Close", adj_close));
        }

        Ok(RawTable {
            index: Some(RawIndex {
                name: Some("Date".to_string()),
                values: dates,
            }),
            columns,
        })
    }

    /// Execute the HTTP request with retry and exponential backoff.
    fn download_with_retry(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<RawTable, DataError> {
        let url = Self::chart_url(ticker, start, end, interval);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    // Some edges 404 unknown symbols instead of returning a
                    // chart error body.
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(RawTable::empty());
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::NetworkUnreachable(format!(
                            "HTTP {status} for {ticker}"
                        )));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {ticker}: {e}"
                        ))
                    })?;

                    return Self::parse_response(ticker, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".to_string())))
    }
}

fn number_or_null(value: Option<f64>) -> RawValue {
    match value {
        Some(n) => RawValue::Number(n),
        None => RawValue::Null,
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn download(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<RawTable, DataError> {
        let ticker = ticker.trim();
        let mut table = self.download_with_retry(ticker, start, end, interval)?;
        table.flatten_field_labels(ticker);
        Ok(table)
    }
}
