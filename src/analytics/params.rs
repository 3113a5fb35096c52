//! Analytics Parameters
//!
//! Thresholds for the regression engine and the detectors.
//! Defaults reproduce the dashboard's documented heuristics.

use serde::{Deserialize, Serialize};

/// Upper bound on projected steps
pub const MAX_PROJECTION_STEPS: usize = 3650;
/// Upper bound on requested history (100 years)
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// All analytics parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub regression: RegressionParams,
    #[serde(default)]
    pub clusters: ClusterParams,
    #[serde(default)]
    pub expirations: ExpirationParams,
    #[serde(default)]
    pub volatility: VolatilityParams,
}

impl AnalyticsConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.regression.validate()?;
        self.clusters.validate()?;
        self.expirations.validate()?;
        self.volatility.validate()?;
        Ok(())
    }
}

/// How projected dates advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionCalendar {
    /// One calendar day per step, weekends and holidays included
    #[default]
    Calendar,
    /// Skip Saturdays and Sundays (no holiday calendar)
    Weekdays,
}

/// Regression engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionParams {
    /// Minimum number of prices to attempt a fit
    pub min_points: usize,
    /// Prices are floored to this value before taking the log
    pub price_floor: f64,
    /// Default number of projected steps
    pub projection_days: usize,
    /// Days of history requested from the data source
    pub lookback_days: u32,
    /// Date stepping used for projected points
    pub calendar: ProjectionCalendar,
}

impl Default for RegressionParams {
    fn default() -> Self {
        Self {
            min_points: 2,
            price_floor: 0.01,
            projection_days: 30,
            lookback_days: 365,
            calendar: ProjectionCalendar::Calendar,
        }
    }
}

impl RegressionParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.min_points < 2 {
            return Err(ParamsError::InvalidMinPoints(self.min_points));
        }
        if !self.price_floor.is_finite() || self.price_floor <= 0.0 {
            return Err(ParamsError::InvalidPriceFloor(self.price_floor));
        }
        if self.projection_days > MAX_PROJECTION_STEPS {
            return Err(ParamsError::InvalidProjection(self.projection_days));
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ParamsError::InvalidLookback(self.lookback_days));
        }
        Ok(())
    }
}

/// Proximity clustering algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProximityStrategy {
    /// Single pass in input order; the first unassigned print anchors a cluster
    #[default]
    Greedy,
    /// Sort by price, then merge neighbours within the radius
    SortedMerge,
}

/// Transaction clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Minimum prints for a group to qualify as a key level
    pub density_threshold: usize,
    /// Proximity radius in price units
    pub proximity_radius: f64,
    pub proximity_strategy: ProximityStrategy,
    /// Institutions listed per level
    pub max_institutions: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            density_threshold: 5,
            proximity_radius: 0.5,
            proximity_strategy: ProximityStrategy::Greedy,
            max_institutions: 5,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.density_threshold == 0 {
            return Err(ParamsError::InvalidDensityThreshold(self.density_threshold));
        }
        if !self.proximity_radius.is_finite() || self.proximity_radius < 0.0 {
            return Err(ParamsError::InvalidRadius(self.proximity_radius));
        }
        Ok(())
    }
}

/// Expiration aggregation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationParams {
    /// Forward window in calendar days
    pub days_ahead: i64,
    pub high_premium: f64,
    pub high_volume: f64,
    pub medium_premium: f64,
    pub medium_volume: f64,
}

impl Default for ExpirationParams {
    fn default() -> Self {
        Self {
            days_ahead: 30,
            high_premium: 100_000_000.0,
            high_volume: 100_000.0,
            medium_premium: 50_000_000.0,
            medium_volume: 50_000.0,
        }
    }
}

impl ExpirationParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.days_ahead < 0 {
            return Err(ParamsError::InvalidWindow(self.days_ahead));
        }
        if self.medium_premium > self.high_premium || self.medium_volume > self.high_volume {
            return Err(ParamsError::InvertedImpactThresholds);
        }
        Ok(())
    }
}

/// Volatility spike parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityParams {
    /// Relative IV change above which an alert is a spike (0.05 = 5%)
    pub spike_threshold: f64,
    /// Spike count above which impact is high
    pub high_spike_count: usize,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            spike_threshold: 0.05,
            high_spike_count: 10,
        }
    }
}

impl VolatilityParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.spike_threshold.is_finite() || self.spike_threshold < 0.0 {
            return Err(ParamsError::InvalidSpikeThreshold(self.spike_threshold));
        }
        Ok(())
    }
}

/// Caller-side whale filter applied before clustering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub min_whale_premium: f64,
    pub min_whale_volume: f64,
}

impl FilterParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.min_whale_premium < 0.0 || self.min_whale_volume < 0.0 {
            return Err(ParamsError::InvalidFilter);
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid min_points: {0} (minimum 2)")]
    InvalidMinPoints(usize),
    #[error("Invalid price floor: {0} (must be finite and > 0)")]
    InvalidPriceFloor(f64),
    #[error("Invalid projection horizon: {0} (max 3650)")]
    InvalidProjection(usize),
    #[error("Invalid lookback: {0} days (must be 1..=36500)")]
    InvalidLookback(u32),
    #[error("Invalid density threshold: {0} (must be >= 1)")]
    InvalidDensityThreshold(usize),
    #[error("Invalid proximity radius: {0} (must be finite and >= 0)")]
    InvalidRadius(f64),
    #[error("Invalid expiration window: {0} days (must be >= 0)")]
    InvalidWindow(i64),
    #[error("Medium impact thresholds must not exceed high impact thresholds")]
    InvertedImpactThresholds,
    #[error("Invalid spike threshold: {0} (must be finite and >= 0)")]
    InvalidSpikeThreshold(f64),
    #[error("Whale filter minimums must be >= 0")]
    InvalidFilter,
}
