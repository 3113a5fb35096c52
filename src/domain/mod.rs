//! Domain Layer - Core data types for the flowscope analytics core
//!
//! Plain data with no I/O. Inputs arrive from the data-access layer
//! already deserialized; derived types are recomputed on every call.
//!
//! - `market`: Price points, executed prints, options flow alerts
//! - `levels`: Key levels found by transaction clustering
//! - `alerts`: Expiration alerts and contextual alerts

pub mod market;
pub mod levels;
pub mod alerts;

pub use market::{PricePoint, Transaction, FlowAlert};
pub use levels::{KeyLevel, KeyLevelKind, Strength};
pub use alerts::{Impact, ExpirationAlert, AlertCategory, ContextualAlert, format_premium};
