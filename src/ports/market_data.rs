//! Market Data Port
//!
//! Data-access boundary. Implementations fetch and deserialize raw inputs;
//! the analytics core only ever sees the resulting slices.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FlowAlert, PricePoint, Transaction};

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("No data for ticker: {0}")]
    TickerNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Market data port trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Daily closes for the last `days` days, ascending by date
    async fn price_history(&self, ticker: &str, days: u32) -> Result<Vec<PricePoint>, MarketDataError>;

    /// Large block prints
    async fn whale_trades(&self, ticker: &str) -> Result<Vec<Transaction>, MarketDataError>;

    /// Off-exchange prints
    async fn dark_pool_prints(&self, ticker: &str) -> Result<Vec<Transaction>, MarketDataError>;

    /// Options flow alerts
    async fn flow_alerts(&self, ticker: &str) -> Result<Vec<FlowAlert>, MarketDataError>;
}
