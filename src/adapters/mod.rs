//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Cache: in-memory TTL cache behind `AnalysisCache`
//! - Snapshot: `MarketDataPort` served from a JSON snapshot file
//! - CLI: Command-line interface handlers

pub mod cache;
pub mod snapshot;
pub mod cli;

pub use cache::TtlCache;
pub use snapshot::{SnapshotMarketData, TickerSnapshot, OhlcBar};
pub use cli::CliApp;
