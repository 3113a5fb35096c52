//! Analytics Core - Trend channels and flow pattern detection
//!
//! Pure, synchronous computations over already-fetched slices:
//! - Log-linear regression channel with multiplicative sigma bands
//! - Exact-price and proximity clustering of executed prints (key levels)
//! - Options expiration concentration
//! - Implied volatility spikes
//! - Contextual alert composition from the detectors above
//!
//! Nothing here performs I/O or holds state between calls.

pub mod error;
pub mod params;
pub mod regression;
pub mod clusters;
pub mod expirations;
pub mod volatility;
pub mod composer;

pub use error::AnalyticsError;
pub use params::{
    AnalyticsConfig, RegressionParams, ClusterParams, ExpirationParams, VolatilityParams, FilterParams,
    ProjectionCalendar, ProximityStrategy, ParamsError, MAX_PROJECTION_STEPS, MAX_LOOKBACK_DAYS,
};
pub use regression::{
    RegressionEngine, RegressionResult, RegressionPoint, RegressionServiceResponse, DateStepper, CalendarDays,
    Weekdays,
};
pub use clusters::TransactionClusterDetector;
pub use expirations::ExpirationAggregator;
pub use volatility::{VolatilitySpikeDetector, VolatilitySpike, VolatilityReport};
pub use composer::{ContextualAlertComposer, AlertInputs};
