//! Snapshot Market Data
//!
//! `MarketDataPort` backed by a JSON snapshot of already-fetched feeds:
//!
//! ```json
//! { "tickers": { "AAPL": { "prices": [...], "whale_trades": [...],
//!                          "dark_pool": [...], "flow_alerts": [...] } } }
//! ```
//!
//! Price bars may carry open/high/low/volume; only `date` and `close` are used.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::{FlowAlert, PricePoint, Transaction};
use crate::ports::{MarketDataError, MarketDataPort};

/// One OHLC bar as delivered by the price feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl From<&OhlcBar> for PricePoint {
    fn from(bar: &OhlcBar) -> Self {
        PricePoint::new(bar.date, bar.close)
    }
}

/// Feeds for one ticker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerSnapshot {
    #[serde(default)]
    pub prices: Vec<OhlcBar>,
    #[serde(default)]
    pub whale_trades: Vec<Transaction>,
    #[serde(default)]
    pub dark_pool: Vec<Transaction>,
    #[serde(default)]
    pub flow_alerts: Vec<FlowAlert>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    tickers: HashMap<String, TickerSnapshot>,
}

/// Market data served from an in-memory snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotMarketData {
    tickers: HashMap<String, TickerSnapshot>,
}

impl SnapshotMarketData {
    pub fn from_json(json: &str) -> Result<Self, MarketDataError> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        let tickers = file
            .tickers
            .into_iter()
            .map(|(ticker, snapshot)| (ticker.to_uppercase(), snapshot))
            .collect();
        Ok(Self { tickers })
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, MarketDataError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Add or replace one ticker
    pub fn with_ticker(mut self, ticker: &str, snapshot: TickerSnapshot) -> Self {
        self.tickers.insert(ticker.to_uppercase(), snapshot);
        self
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.tickers.keys().map(String::as_str)
    }

    fn ticker(&self, ticker: &str) -> Result<&TickerSnapshot, MarketDataError> {
        self.tickers
            .get(&ticker.to_uppercase())
            .ok_or_else(|| MarketDataError::TickerNotFound(ticker.to_string()))
    }
}

#[async_trait]
impl MarketDataPort for SnapshotMarketData {
    async fn price_history(&self, ticker: &str, days: u32) -> Result<Vec<PricePoint>, MarketDataError> {
        let snapshot = self.ticker(ticker)?;
        let mut prices: Vec<PricePoint> = snapshot.prices.iter().map(PricePoint::from).collect();
        prices.sort_by_key(|p| p.date);

        // A window reaching past the earliest representable date keeps every bar
        let cutoff = prices
            .last()
            .and_then(|p| p.date.checked_sub_signed(Duration::days(i64::from(days))));
        if let Some(cutoff) = cutoff {
            prices.retain(|p| p.date > cutoff);
        }
        Ok(prices)
    }

    async fn whale_trades(&self, ticker: &str) -> Result<Vec<Transaction>, MarketDataError> {
        Ok(self.ticker(ticker)?.whale_trades.clone())
    }

    async fn dark_pool_prints(&self, ticker: &str) -> Result<Vec<Transaction>, MarketDataError> {
        Ok(self.ticker(ticker)?.dark_pool.clone())
    }

    async fn flow_alerts(&self, ticker: &str) -> Result<Vec<FlowAlert>, MarketDataError> {
        Ok(self.ticker(ticker)?.flow_alerts.clone())
    }
}
