//! Analytics Errors

use thiserror::Error;

/// Errors returned by the analytics core.
///
/// Public entry points that face the presentation layer turn these into
/// typed failure values (`success = false`, omitted alert) instead of
/// propagating them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Insufficient data: requires {required} points, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
