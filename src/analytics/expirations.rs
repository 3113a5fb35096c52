//! Options Expiration Aggregation
//!
//! Groups flow alerts by expiry date inside a forward window and grades
//! how much premium / volume is concentrated on each date.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::analytics::params::ExpirationParams;
use crate::domain::{ExpirationAlert, FlowAlert, Impact};

#[derive(Debug, Default)]
struct ExpiryBucket {
    strikes: BTreeSet<i64>,
    total_volume: f64,
    total_premium: f64,
}

/// Per-expiry concentration of options flow
#[derive(Debug, Clone, Default)]
pub struct ExpirationAggregator {
    params: ExpirationParams,
}

impl ExpirationAggregator {
    pub fn new(params: ExpirationParams) -> Self {
        Self { params }
    }

    pub fn with_days_ahead(mut self, days_ahead: i64) -> Self {
        self.params.days_ahead = days_ahead;
        self
    }

    /// Classify a bucket's market impact
    pub fn classify(&self, total_premium: f64, total_volume: f64) -> Impact {
        let p = &self.params;
        if total_premium > p.high_premium || total_volume > p.high_volume {
            Impact::High
        } else if total_premium > p.medium_premium || total_volume > p.medium_volume {
            Impact::Medium
        } else {
            Impact::Low
        }
    }

    /// Aggregate alerts expiring between `today` and `today + days_ahead`
    /// (both inclusive), ascending by days until expiry. Strikes are
    /// counted as distinct after rounding to the cent.
    pub fn aggregate(&self, alerts: &[FlowAlert], today: NaiveDate) -> Vec<ExpirationAlert> {
        let mut buckets: BTreeMap<NaiveDate, ExpiryBucket> = BTreeMap::new();

        for alert in alerts {
            let days_until = (alert.expiry - today).num_days();
            if days_until < 0 || days_until > self.params.days_ahead {
                continue;
            }
            let bucket = buckets.entry(alert.expiry).or_default();
            if alert.strike.is_finite() {
                bucket.strikes.insert((alert.strike * 100.0).round() as i64);
            }
            bucket.total_volume += alert.volume;
            bucket.total_premium += alert.premium;
        }

        let expirations: Vec<ExpirationAlert> = buckets
            .into_iter()
            .map(|(expiry, bucket)| ExpirationAlert {
                expiry,
                days_until: (expiry - today).num_days(),
                strike_count: bucket.strikes.len(),
                total_volume: bucket.total_volume,
                total_premium: bucket.total_premium,
                impact: self.classify(bucket.total_premium, bucket.total_volume),
            })
            .collect();

        tracing::debug!(
            alerts = alerts.len(),
            expirations = expirations.len(),
            days_ahead = self.params.days_ahead,
            "aggregated expirations"
        );
        expirations
    }
}
