//! Implied Volatility Spike Detection
//!
//! relative_change = (iv_end - iv_start) / iv_start
//!
//! Alerts with a zero (or non-finite) starting IV are skipped. An alert is a
//! spike when its relative change exceeds the threshold (5% by default).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::params::VolatilityParams;
use crate::domain::{FlowAlert, Impact};

/// One alert whose IV jumped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySpike {
    pub ticker: String,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub iv_start: f64,
    pub iv_end: f64,
    pub relative_change: f64,
}

/// Spikes found in a batch of alerts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReport {
    /// Spikes in input order
    pub spikes: Vec<VolatilitySpike>,
    /// `None` when there are no spikes
    pub impact: Option<Impact>,
}

impl VolatilityReport {
    pub fn spike_count(&self) -> usize {
        self.spikes.len()
    }

    /// Spike with the largest relative change
    pub fn largest(&self) -> Option<&VolatilitySpike> {
        self.spikes
            .iter()
            .max_by(|a, b| a.relative_change.total_cmp(&b.relative_change))
    }
}

#[derive(Debug, Clone, Default)]
pub struct VolatilitySpikeDetector {
    params: VolatilityParams,
}

impl VolatilitySpikeDetector {
    pub fn new(params: VolatilityParams) -> Self {
        Self { params }
    }

    pub fn detect(&self, alerts: &[FlowAlert]) -> VolatilityReport {
        let spikes: Vec<VolatilitySpike> = alerts
            .iter()
            .filter_map(|alert| {
                let change = alert.iv_relative_change()?;
                (change > self.params.spike_threshold).then(|| VolatilitySpike {
                    ticker: alert.ticker.clone(),
                    strike: alert.strike,
                    expiry: alert.expiry,
                    iv_start: alert.iv_start,
                    iv_end: alert.iv_end,
                    relative_change: change,
                })
            })
            .collect();

        let impact = if spikes.len() > self.params.high_spike_count {
            Some(Impact::High)
        } else if !spikes.is_empty() {
            Some(Impact::Medium)
        } else {
            None
        };

        tracing::debug!(alerts = alerts.len(), spikes = spikes.len(), ?impact, "volatility scan");
        VolatilityReport { spikes, impact }
    }
}
