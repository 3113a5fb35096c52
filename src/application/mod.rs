pub mod service;

pub use service::{
    AnalyticsService, RegressionKey, AlertKey, RegressionCache, AlertCache, series_fingerprint,
    DEFAULT_REGRESSION_TTL, DEFAULT_ALERTS_TTL,
};
