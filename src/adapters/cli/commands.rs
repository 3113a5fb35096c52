//! CLI Command Handlers
//!
//! Runs the analytics service against a JSON market snapshot and prints
//! the result as pretty JSON on stdout.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::adapters::snapshot::SnapshotMarketData;
use crate::application::AnalyticsService;
use crate::config::{load_config, Config};

/// Flowscope - regression channels and contextual alerts for market flow data
#[derive(Parser, Debug)]
#[command(
    name = "flowscope",
    version = env!("CARGO_PKG_VERSION"),
    about = "Regression channels and contextual alerts for market flow data",
    long_about = "Flowscope fits a log-linear regression channel to a price history and \
                  derives key levels, expiration pressure and volatility alerts from \
                  whale, dark pool and options flow feeds."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fit the regression channel and projection for a ticker
    Regression(RegressionCmd),

    /// Compose contextual alerts for a ticker
    Alerts(AlertsCmd),
}

/// Regression channel
#[derive(Parser, Debug)]
pub struct RegressionCmd {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the JSON market snapshot
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Ticker symbol
    #[arg(short, long, value_name = "TICKER")]
    pub ticker: String,

    /// Number of projected steps (overrides regression.projection_days)
    #[arg(long, value_name = "STEPS")]
    pub horizon: Option<usize>,
}

/// Contextual alerts
#[derive(Parser, Debug)]
pub struct AlertsCmd {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the JSON market snapshot
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Ticker symbol
    #[arg(short, long, value_name = "TICKER")]
    pub ticker: String,

    /// Reference date for expirations (YYYY-MM-DD, defaults to today in UTC)
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

impl Command {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Regression(cmd) => cmd.config.as_deref(),
            Command::Alerts(cmd) => cmd.config.as_deref(),
        }
    }
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = resolve_config(app.command.config_path())?;
    init_logging(app.verbose, app.debug, &config.logging.get_level())?;

    match app.command {
        Command::Regression(cmd) => regression_command(cmd, &config).await,
        Command::Alerts(cmd) => alerts_command(cmd, &config).await,
    }
}

/// Load the config file when one is given, otherwise use defaults
fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
            load_config(&expanded)
                .with_context(|| format!("Failed to load configuration from {}", expanded))
        }
        None => Ok(Config::default()),
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };

    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("Invalid log filter: {}", level))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn load_snapshot(path: &Path) -> Result<SnapshotMarketData> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
    SnapshotMarketData::load(&expanded)
        .await
        .with_context(|| format!("Failed to load snapshot from {}", expanded))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Handle regression command
async fn regression_command(cmd: RegressionCmd, config: &Config) -> Result<()> {
    tracing::info!("Fitting regression channel for {}", cmd.ticker);

    let market_data = load_snapshot(&cmd.snapshot).await?;
    let service = AnalyticsService::from_config(market_data, config);

    let response = service.regression(&cmd.ticker, cmd.horizon).await;
    if !response.success {
        tracing::warn!(
            "Regression for {} failed: {}",
            cmd.ticker,
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    print_json(&response)
}

/// Handle alerts command
async fn alerts_command(cmd: AlertsCmd, config: &Config) -> Result<()> {
    let today = cmd.today.unwrap_or_else(|| Utc::now().date_naive());
    tracing::info!("Composing alerts for {} as of {}", cmd.ticker, today);

    let market_data = load_snapshot(&cmd.snapshot).await?;
    let service = AnalyticsService::from_config(market_data, config);

    let alerts = service.contextual_alerts(&cmd.ticker, today).await;
    tracing::info!("{} alerts composed", alerts.len());

    print_json(&alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliApp::command().debug_assert();
    }

    #[test]
    fn test_parse_regression() {
        let app = CliApp::try_parse_from([
            "flowscope", "regression", "--snapshot", "snap.json", "--ticker", "AAPL", "--horizon", "10",
        ])
        .unwrap();

        match app.command {
            Command::Regression(cmd) => {
                assert_eq!(cmd.ticker, "AAPL");
                assert_eq!(cmd.horizon, Some(10));
                assert!(cmd.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_alerts_with_date() {
        let app = CliApp::try_parse_from([
            "flowscope", "--debug", "alerts", "-s", "snap.json", "-t", "SPY", "--today", "2026-10-16",
        ])
        .unwrap();

        assert!(app.debug);
        match app.command {
            Command::Alerts(cmd) => {
                assert_eq!(cmd.today, NaiveDate::from_ymd_opt(2026, 10, 16));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_date() {
        let result = CliApp::try_parse_from([
            "flowscope", "alerts", "-s", "snap.json", "-t", "SPY", "--today", "yesterday",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_config_defaults() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config.regression.projection_days, 30);
    }

    #[test]
    fn test_resolve_config_missing_file() {
        assert!(resolve_config(Some(Path::new("/nonexistent/flowscope.toml"))).is_err());
    }
}
