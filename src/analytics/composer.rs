//! Contextual Alert Composer
//!
//! Runs the detectors for one ticker and turns the strongest finding of
//! each into a short alert. At most one alert per category, always in the
//! order whale support, expiration, dark-pool cluster, volatility spike.
//! A detector that fails or has no input drops its category.

use chrono::NaiveDate;

use crate::analytics::clusters::TransactionClusterDetector;
use crate::analytics::error::AnalyticsError;
use crate::analytics::expirations::ExpirationAggregator;
use crate::analytics::params::AnalyticsConfig;
use crate::analytics::volatility::VolatilitySpikeDetector;
use crate::domain::{
    format_premium, AlertCategory, ContextualAlert, ExpirationAlert, FlowAlert, Impact, KeyLevel, Transaction,
};

/// Raw feeds for one ticker
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertInputs<'a> {
    /// Large prints, already filtered by the caller
    pub whale_trades: &'a [Transaction],
    /// Off-exchange prints
    pub dark_pool_prints: &'a [Transaction],
    pub flow_alerts: &'a [FlowAlert],
}

#[derive(Debug, Clone, Default)]
pub struct ContextualAlertComposer {
    clusters: TransactionClusterDetector,
    expirations: ExpirationAggregator,
    volatility: VolatilitySpikeDetector,
}

impl ContextualAlertComposer {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            clusters: TransactionClusterDetector::new(config.clusters.clone()),
            expirations: ExpirationAggregator::new(config.expirations.clone()),
            volatility: VolatilitySpikeDetector::new(config.volatility.clone()),
        }
    }

    /// Compose alerts for `ticker` as of `today`
    pub fn compose(&self, ticker: &str, inputs: AlertInputs<'_>, today: NaiveDate) -> Vec<ContextualAlert> {
        let mut alerts = Vec::with_capacity(AlertCategory::ALL.len());

        for category in AlertCategory::ALL {
            let outcome = match category {
                AlertCategory::WhaleSupport => self.whale_support(inputs.whale_trades),
                AlertCategory::Expiration => Ok(self.expiration(inputs.flow_alerts, today)),
                AlertCategory::DarkPoolCluster => self.dark_pool(inputs.dark_pool_prints),
                AlertCategory::VolatilitySpike => Ok(self.volatility_spike(inputs.flow_alerts)),
            };

            match outcome {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => {}
                Err(e) => tracing::warn!(ticker, ?category, error = %e, "detector failed, alert omitted"),
            }
        }

        tracing::debug!(ticker, alerts = alerts.len(), "composed contextual alerts");
        alerts
    }

    fn whale_support(&self, trades: &[Transaction]) -> Result<Option<ContextualAlert>, AnalyticsError> {
        if trades.is_empty() {
            return Ok(None);
        }
        let levels = self.clusters.exact_levels(trades)?;
        Ok(levels.first().map(|level| {
            let mut description = format!(
                "{} whale prints totaling {} stacked at ${:.2}",
                level.transaction_count,
                format_premium(level.total_premium),
                level.price
            );
            append_institutions(&mut description, level);
            level_alert(AlertCategory::WhaleSupport, level, description)
        }))
    }

    fn expiration(&self, flow: &[FlowAlert], today: NaiveDate) -> Option<ContextualAlert> {
        if flow.is_empty() {
            return None;
        }
        let expirations = self.expirations.aggregate(flow, today);
        expirations.first().map(expiration_alert)
    }

    fn dark_pool(&self, prints: &[Transaction]) -> Result<Option<ContextualAlert>, AnalyticsError> {
        if prints.is_empty() {
            return Ok(None);
        }
        let levels = self.clusters.proximity_levels(prints)?;
        Ok(levels.first().map(|level| {
            let mut description = format!(
                "{} dark pool prints totaling {} clustered near ${:.2}",
                level.transaction_count,
                format_premium(level.total_premium),
                level.price
            );
            append_institutions(&mut description, level);
            level_alert(AlertCategory::DarkPoolCluster, level, description)
        }))
    }

    fn volatility_spike(&self, flow: &[FlowAlert]) -> Option<ContextualAlert> {
        if flow.is_empty() {
            return None;
        }
        let report = self.volatility.detect(flow);
        let impact = report.impact?;
        let largest = report.largest()?;

        let description = format!(
            "{} contracts repriced IV sharply; largest move {:+.1}% on the ${:.2} strike expiring {}",
            report.spike_count(),
            largest.relative_change * 100.0,
            largest.strike,
            largest.expiry.format("%Y-%m-%d")
        );

        Some(ContextualAlert {
            category: AlertCategory::VolatilitySpike,
            title: AlertCategory::VolatilitySpike.title().to_string(),
            description,
            value: format!("{} spikes", report.spike_count()),
            impact,
            timestamp: None,
        })
    }
}

fn level_alert(category: AlertCategory, level: &KeyLevel, description: String) -> ContextualAlert {
    ContextualAlert {
        category,
        title: category.title().to_string(),
        description,
        value: format!("${:.2}", level.price),
        impact: Impact::from(level.strength),
        timestamp: level.last_executed_at,
    }
}

fn append_institutions(description: &mut String, level: &KeyLevel) {
    if !level.institutions.is_empty() {
        description.push_str(&format!(" ({})", level.institutions.join(", ")));
    }
}

fn expiration_alert(expiration: &ExpirationAlert) -> ContextualAlert {
    let when = match expiration.days_until {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {n} days"),
    };
    let description = format!(
        "{} strikes expiring {} with {} premium on {:.0} contracts",
        expiration.strike_count,
        when,
        format_premium(expiration.total_premium),
        expiration.total_volume
    );

    ContextualAlert {
        category: AlertCategory::Expiration,
        title: AlertCategory::Expiration.title().to_string(),
        description,
        value: expiration.expiry.format("%Y-%m-%d").to_string(),
        impact: expiration.impact,
        timestamp: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn tx(price: f64, premium: f64) -> Transaction {
        Transaction::new(price, 500.0, premium, Utc.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap())
    }

    fn flow(days: i64, strike: f64, iv_start: f64, iv_end: f64) -> FlowAlert {
        FlowAlert {
            ticker: "AMD".to_string(),
            strike,
            expiry: today() + Duration::days(days),
            premium: 400_000.0,
            volume: 1_200.0,
            iv_start,
            iv_end,
        }
    }

    #[test]
    fn test_all_categories_in_fixed_order() {
        // Volatility is the highest impact here but still comes last
        let whales: Vec<_> = (0..5).map(|_| tx(160.0, 1_000_000.0)).collect();
        let dark: Vec<_> = (0..12).map(|i| tx(158.0 + i as f64 * 0.01, 250_000.0)).collect();
        let flows: Vec<_> = (0..12).map(|i| flow(3, 150.0 + i as f64, 0.4, 0.5)).collect();

        let inputs = AlertInputs {
            whale_trades: &whales,
            dark_pool_prints: &dark,
            flow_alerts: &flows,
        };
        let alerts = ContextualAlertComposer::default().compose("AMD", inputs, today());

        let categories: Vec<_> = alerts.iter().map(|a| a.category).collect();
        assert_eq!(categories, AlertCategory::ALL.to_vec());
        assert_eq!(alerts[0].impact, Impact::Low);
        assert_eq!(alerts[2].impact, Impact::High);
        assert_eq!(alerts[3].impact, Impact::High);
    }

    #[test]
    fn test_whale_alert_uses_strongest_level() {
        let mut whales: Vec<_> = (0..5).map(|_| tx(95.0, 100_000.0)).collect();
        whales.extend((0..8).map(|_| tx(100.0, 2_000_000.0).with_institution("GS")));

        let inputs = AlertInputs {
            whale_trades: &whales,
            ..Default::default()
        };
        let alerts = ContextualAlertComposer::default().compose("AAPL", inputs, today());

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.category, AlertCategory::WhaleSupport);
        assert_eq!(alert.value, "$100.00");
        assert_eq!(alert.impact, Impact::Medium);
        assert!(alert.description.starts_with("8 whale prints totaling $16.00M"));
        assert!(alert.description.ends_with("(GS)"));
        assert!(alert.timestamp.is_some());
    }

    #[test]
    fn test_expiration_alert_soonest_first() {
        let flows = vec![flow(12, 100.0, 0.3, 0.3), flow(2, 105.0, 0.3, 0.3), flow(2, 110.0, 0.3, 0.3)];
        let inputs = AlertInputs {
            flow_alerts: &flows,
            ..Default::default()
        };
        let alerts = ContextualAlertComposer::default().compose("QQQ", inputs, today());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Expiration);
        assert_eq!(alerts[0].value, "2026-10-19");
        assert!(alerts[0].description.starts_with("2 strikes expiring in 2 days"));
        assert_eq!(alerts[0].impact, Impact::Low);
    }

    #[test]
    fn test_below_threshold_omits_category() {
        let whales: Vec<_> = (0..4).map(|_| tx(10.0, 1.0)).collect();
        let inputs = AlertInputs {
            whale_trades: &whales,
            ..Default::default()
        };
        assert!(ContextualAlertComposer::default().compose("F", inputs, today()).is_empty());
    }

    #[test]
    fn test_detector_error_omits_category_only() {
        let mut config = AnalyticsConfig::default();
        config.clusters.density_threshold = 0;
        let composer = ContextualAlertComposer::new(&config);

        let whales: Vec<_> = (0..6).map(|_| tx(10.0, 1.0)).collect();
        let flows = vec![flow(0, 10.0, 0.2, 0.3)];
        let inputs = AlertInputs {
            whale_trades: &whales,
            dark_pool_prints: &whales,
            flow_alerts: &flows,
        };
        let alerts = composer.compose("F", inputs, today());

        let categories: Vec<_> = alerts.iter().map(|a| a.category).collect();
        assert_eq!(categories, vec![AlertCategory::Expiration, AlertCategory::VolatilitySpike]);
        assert!(alerts[0].description.contains("expiring today"));
    }

    #[test]
    fn test_empty_inputs() {
        let alerts = ContextualAlertComposer::default().compose("SPY", AlertInputs::default(), today());
        assert!(alerts.is_empty());
    }
}
