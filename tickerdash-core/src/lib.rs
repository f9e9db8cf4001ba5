//! tickerdash-core — the dashboard's price-series pipeline.
//!
//! This crate contains everything with real invariants:
//! - Raw provider tables and the provider trait (`data::raw`, `data::provider`)
//! - Cleaning into a canonical `PriceTable` (`data::clean`)
//! - Per-query CSV cache with explicit hit/miss/damaged results (`data::cache`)
//! - Cache-aside orchestration with a session memo tier (`data::pipeline`)
//! - Moving average and RSI over the cleaned table (`indicators`)
//!
//! Chart rendering and UI layout are presentation concerns and live outside
//! this crate entirely.

pub mod data;
pub mod indicators;
