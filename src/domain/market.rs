//! Market Inputs
//!
//! Read-only records handed to the analytics core by the data-access layer:
//! closing prices, executed prints (whale trades and dark-pool prints) and
//! options flow alerts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One closing price in an ordered series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date of the close
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// An executed print (block trade or dark-pool print)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Execution price
    pub price: f64,
    /// Shares / contracts executed
    #[serde(default)]
    pub volume: f64,
    /// Dollar value of the print
    #[serde(default)]
    pub premium: f64,
    /// Execution time
    pub executed_at: DateTime<Utc>,
    /// Reporting venue or institution, when known
    #[serde(default, alias = "venue")]
    pub institution: Option<String>,
}

impl Transaction {
    pub fn new(price: f64, volume: f64, premium: f64, executed_at: DateTime<Utc>) -> Self {
        Self {
            price,
            volume,
            premium,
            executed_at,
            institution: None,
        }
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }
}

/// An options flow alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAlert {
    pub ticker: String,
    pub strike: f64,
    pub expiry: NaiveDate,
    #[serde(default)]
    pub premium: f64,
    #[serde(default)]
    pub volume: f64,
    /// Implied volatility when the alert was first observed
    #[serde(default)]
    pub iv_start: f64,
    /// Implied volatility at execution
    #[serde(default)]
    pub iv_end: f64,
}

impl FlowAlert {
    /// Relative IV move between observation and execution.
    ///
    /// `None` when `iv_start` is zero or either side is not finite.
    pub fn iv_relative_change(&self) -> Option<f64> {
        if self.iv_start == 0.0 || !self.iv_start.is_finite() || !self.iv_end.is_finite() {
            return None;
        }
        Some((self.iv_end - self.iv_start) / self.iv_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(iv_start: f64, iv_end: f64) -> FlowAlert {
        FlowAlert {
            ticker: "SPY".to_string(),
            strike: 500.0,
            expiry: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            premium: 1_000_000.0,
            volume: 1_000.0,
            iv_start,
            iv_end,
        }
    }

    #[test]
    fn test_iv_relative_change() {
        let change = alert(0.20, 0.25).iv_relative_change().unwrap();
        assert!((change - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_iv_relative_change_zero_start() {
        assert!(alert(0.0, 0.30).iv_relative_change().is_none());
        assert!(alert(f64::NAN, 0.30).iv_relative_change().is_none());
    }

    #[test]
    fn test_transaction_accepts_venue_alias() {
        let json = r#"{
            "price": 101.25,
            "volume": 5000,
            "premium": 506250,
            "executed_at": "2026-10-16T14:30:00Z",
            "venue": "FINRA-ADF"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.institution.as_deref(), Some("FINRA-ADF"));
        assert_eq!(tx.price, 101.25);
    }
}
