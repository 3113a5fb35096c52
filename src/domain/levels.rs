//! Key Levels
//!
//! Price levels where executed prints concentrate. Derived on every call,
//! never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Print count at or above which a level is `High` strength
pub const HIGH_STRENGTH_COUNT: usize = 10;
/// Print count at or above which a level is `Medium` strength
pub const MEDIUM_STRENGTH_COUNT: usize = 7;

/// How the level was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyLevelKind {
    /// Whale prints stacked on the exact same rounded price
    WhaleSupport,
    /// Dark-pool prints packed within a price radius
    DarkPoolCluster,
}

/// Level strength, graded by print count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strength {
    Low,
    Medium,
    High,
}

impl Strength {
    /// Grade a group of `count` prints
    pub fn from_count(count: usize) -> Self {
        if count >= HIGH_STRENGTH_COUNT {
            Strength::High
        } else if count >= MEDIUM_STRENGTH_COUNT {
            Strength::Medium
        } else {
            Strength::Low
        }
    }
}

/// A statistically dense price level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLevel {
    pub price: f64,
    pub kind: KeyLevelKind,
    pub strength: Strength,
    pub transaction_count: usize,
    pub total_volume: f64,
    pub total_premium: f64,
    /// Up to five distinct institutions, in first-seen order
    pub institutions: Vec<String>,
    /// Newest print in the group
    pub last_executed_at: Option<DateTime<Utc>>,
}
