//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, CacheSection, LoggingSection, ConfigError, load_config, parse_config,
};
