//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Market data access (prices, prints, flow alerts)
//! - Result memoization with explicit TTL

pub mod market_data;
pub mod cache;

pub use market_data::{MarketDataPort, MarketDataError};
pub use cache::AnalysisCache;

#[cfg(test)]
pub use market_data::MockMarketDataPort;
