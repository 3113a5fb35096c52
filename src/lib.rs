//! Flowscope - market flow analytics
//!
//! Regression channels over price history plus contextual alerts built from
//! whale trades, dark pool prints and options flow.
//!
//! # Modules
//!
//! - `domain`: Core value types (PricePoint, Transaction, KeyLevel, ContextualAlert)
//! - `ports`: Trait abstractions (MarketDataPort, AnalysisCache)
//! - `analytics`: Regression engine, cluster detection, expirations, volatility, composer
//! - `adapters`: External implementations (TTL cache, JSON snapshot, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Analytics service wiring ports to the core

pub mod domain;
pub mod ports;
pub mod analytics;
pub mod adapters;
pub mod config;
pub mod application;
