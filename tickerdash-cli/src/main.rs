//! tickerdash CLI — run the price pipeline and manage the cache.
//!
//! Commands:
//! - `show` — fetch a ticker through the pipeline, print recent rows and indicators
//! - `cache status` — list cached entries with sizes
//! - `cache clear` — remove cached entries (dry run without --confirm)

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tickerdash_core::data::{CsvCache, Interval, Pipeline, YahooProvider};
use tickerdash_core::indicators::{moving_average, rsi};

#[derive(Parser)]
#[command(
    name = "tickerdash",
    about = "tickerdash CLI — stock price pipeline and indicators"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a ticker through the pipeline and print recent rows and indicators.
    Show {
        /// Ticker symbol (e.g., AAPL).
        ticker: String,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Sampling interval: 1d or 1wk.
        #[arg(long, default_value = "1d")]
        interval: String,

        /// Moving-average window in rows (practical range 5-100).
        #[arg(long, default_value_t = 20)]
        ma_window: usize,

        /// Also compute RSI.
        #[arg(long, default_value_t = false)]
        rsi: bool,

        /// RSI period (practical range 5-30).
        #[arg(long, default_value_t = 14)]
        rsi_period: usize,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Table rows to print.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached entries with sizes.
    Status {
        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
    /// Remove all cached entries (dry run without --confirm).
    Clear {
        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            ticker,
            start,
            end,
            interval,
            ma_window,
            rsi,
            rsi_period,
            cache_dir,
            rows,
        } => run_show(
            ticker, start, end, interval, ma_window, rsi, rsi_period, cache_dir, rows,
        ),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clear { cache_dir, confirm } => run_cache_clear(&cache_dir, confirm),
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn run_show(
    ticker: String,
    start: Option<String>,
    end: Option<String>,
    interval: String,
    ma_window: usize,
    show_rsi: bool,
    rsi_period: usize,
    cache_dir: PathBuf,
    rows: usize,
) -> Result<()> {
    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| end_date - chrono::Duration::days(365));

    let interval: Interval = interval.parse()?;

    let pipeline = Pipeline::new(Box::new(YahooProvider::new()), CsvCache::new(cache_dir));
    let table = pipeline.price_table(&ticker, start_date, end_date, interval)?;

    if table.is_empty() {
        println!("No data found for {ticker} between {start_date} and {end_date}.");
        return Ok(());
    }

    println!(
        "{ticker}: {} rows, {start_date} to {end_date} ({interval})",
        table.height()
    );
    println!("{}", table.frame().tail(Some(rows)));

    let ma = moving_average(&table, ma_window, None)?;
    print_series(&format!("MA{ma_window}"), &ma, rows);

    if show_rsi {
        let series = rsi(&table, rsi_period, None)?;
        print_series(&format!("RSI{rsi_period}"), &series, rows);
    }

    Ok(())
}

/// Print the trailing values of an indicator series, `-` for undefined.
fn print_series(label: &str, series: &[f64], rows: usize) {
    let start = series.len().saturating_sub(rows);
    let tail: Vec<String> = series[start..]
        .iter()
        .map(|v| {
            if v.is_nan() {
                "-".to_string()
            } else {
                format!("{v:.2}")
            }
        })
        .collect();
    println!("{label}: [{}]", tail.join(", "));
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let mut rows: Vec<(String, u64)> = Vec::new();
    let mut total_size = 0u64;

    for entry in std::fs::read_dir(cache_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(".csv") {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        total_size += size;
        rows.push((name, size));
    }

    if rows.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!("Cache: {}", cache_dir.display());
    println!("Entries: {}", rows.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    for (name, size) in &rows {
        println!("{:<48} {:>10}", name, format_size(*size));
    }

    Ok(())
}

fn run_cache_clear(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let mut to_remove: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(cache_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".csv") {
            to_remove.push(entry.path());
        }
    }

    if to_remove.is_empty() {
        println!("Nothing to remove.");
        return Ok(());
    }

    println!("Found {} cached entr(ies):", to_remove.len());
    for path in &to_remove {
        println!("  {}", path.display());
    }

    if !confirm {
        println!();
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    for path in &to_remove {
        std::fs::remove_file(path)?;
    }
    println!("Done. Removed {} entr(ies).", to_remove.len());

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
