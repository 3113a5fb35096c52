//! Alert Types
//!
//! Derived, human-facing results: per-expiry concentration alerts and the
//! small set of contextual alerts shown next to a ticker.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::levels::Strength;

/// Market impact classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl From<Strength> for Impact {
    fn from(strength: Strength) -> Self {
        match strength {
            Strength::High => Impact::High,
            Strength::Medium => Impact::Medium,
            Strength::Low => Impact::Low,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Low => write!(f, "low"),
            Impact::Medium => write!(f, "medium"),
            Impact::High => write!(f, "high"),
        }
    }
}

/// Open interest concentrated on one expiry date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirationAlert {
    pub expiry: NaiveDate,
    /// Calendar days from today (0 = expires today)
    pub days_until: i64,
    /// Distinct strikes seen for this expiry
    pub strike_count: usize,
    pub total_volume: f64,
    pub total_premium: f64,
    pub impact: Impact,
}

/// Alert category; declaration order is display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertCategory {
    WhaleSupport,
    Expiration,
    DarkPoolCluster,
    VolatilitySpike,
}

impl AlertCategory {
    /// All categories in display order
    pub const ALL: [AlertCategory; 4] = [
        AlertCategory::WhaleSupport,
        AlertCategory::Expiration,
        AlertCategory::DarkPoolCluster,
        AlertCategory::VolatilitySpike,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AlertCategory::WhaleSupport => "Whale Support Level",
            AlertCategory::Expiration => "Options Expiration Concentration",
            AlertCategory::DarkPoolCluster => "Dark Pool Cluster",
            AlertCategory::VolatilitySpike => "Volatility Spike",
        }
    }
}

/// A human-readable alert for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualAlert {
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    /// Display value (price, date, count)
    pub value: String,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Compact dollar formatting for alert text ($1.25M, $830.0K, $2.10B)
pub fn format_premium(amount: f64) -> String {
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{sign}${:.2}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}${:.2}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{sign}${:.1}K", abs / 1e3)
    } else {
        format!("{sign}${:.0}", abs)
    }
}
