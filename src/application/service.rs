//! Analytics Service
//!
//! Calling layer around the pure analytics core. Fetches inputs through a
//! `MarketDataPort`, applies the whale filter, memoizes results through
//! injected `AnalysisCache`s and hands the slices to the core.
//!
//! Fetch failures are logged and treated as empty input, so callers always
//! get a typed value back (a failed regression response or fewer alerts).

use chrono::NaiveDate;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::TtlCache;
use crate::analytics::{
    AlertInputs, AnalyticsConfig, ContextualAlertComposer, FilterParams, RegressionEngine, RegressionServiceResponse,
};
use crate::config::Config;
use crate::domain::{ContextualAlert, PricePoint, Transaction};
use crate::ports::{AnalysisCache, MarketDataError, MarketDataPort};

/// Default TTL for cached regression responses
pub const DEFAULT_REGRESSION_TTL: Duration = Duration::from_secs(300);
/// Default TTL for cached alert lists
pub const DEFAULT_ALERTS_TTL: Duration = Duration::from_secs(120);

/// Regression memo key: ticker, fitted series and horizon
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegressionKey {
    pub ticker: String,
    pub series: u64,
    pub horizon: usize,
}

impl RegressionKey {
    pub fn new(ticker: &str, prices: &[PricePoint], horizon: usize) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            series: series_fingerprint(prices),
            horizon,
        }
    }
}

/// Alert memo key: ticker and the day alerts were composed for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub ticker: String,
    pub today: NaiveDate,
}

/// Stable hash of a price series
pub fn series_fingerprint(prices: &[PricePoint]) -> u64 {
    let mut hasher = DefaultHasher::new();
    prices.len().hash(&mut hasher);
    for p in prices {
        p.date.hash(&mut hasher);
        p.close.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

pub type RegressionCache = Arc<dyn AnalysisCache<RegressionKey, RegressionServiceResponse>>;
pub type AlertCache = Arc<dyn AnalysisCache<AlertKey, Vec<ContextualAlert>>>;

pub struct AnalyticsService<M> {
    market_data: M,
    engine: RegressionEngine,
    composer: ContextualAlertComposer,
    filters: FilterParams,
    lookback_days: u32,
    regression_cache: RegressionCache,
    regression_ttl: Duration,
    alert_cache: AlertCache,
    alerts_ttl: Duration,
}

impl<M: MarketDataPort> AnalyticsService<M> {
    /// Service with in-memory caches and default TTLs
    pub fn new(market_data: M, config: AnalyticsConfig) -> Self {
        Self {
            market_data,
            engine: RegressionEngine::new(config.regression.clone()),
            composer: ContextualAlertComposer::new(&config),
            filters: FilterParams::default(),
            lookback_days: config.regression.lookback_days,
            regression_cache: Arc::new(TtlCache::<RegressionKey, RegressionServiceResponse>::new()),
            regression_ttl: DEFAULT_REGRESSION_TTL,
            alert_cache: Arc::new(TtlCache::<AlertKey, Vec<ContextualAlert>>::new()),
            alerts_ttl: DEFAULT_ALERTS_TTL,
        }
    }

    /// Service wired from a loaded configuration file
    pub fn from_config(market_data: M, config: &Config) -> Self {
        let max_entries = config.cache.max_entries;
        let regression_cache: RegressionCache =
            Arc::new(TtlCache::<RegressionKey, RegressionServiceResponse>::with_capacity(max_entries));
        let alert_cache: AlertCache =
            Arc::new(TtlCache::<AlertKey, Vec<ContextualAlert>>::with_capacity(max_entries));

        Self::new(market_data, AnalyticsConfig::from(config))
            .with_filters(config.filters.clone())
            .with_regression_cache(regression_cache, config.cache.regression_ttl())
            .with_alert_cache(alert_cache, config.cache.alerts_ttl())
    }

    pub fn with_filters(mut self, filters: FilterParams) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_regression_cache(mut self, cache: RegressionCache, ttl: Duration) -> Self {
        self.regression_cache = cache;
        self.regression_ttl = ttl;
        self
    }

    pub fn with_alert_cache(mut self, cache: AlertCache, ttl: Duration) -> Self {
        self.alert_cache = cache;
        self.alerts_ttl = ttl;
        self
    }

    /// Regression channel for `ticker`; `horizon` defaults to the configured projection
    pub async fn regression(&self, ticker: &str, horizon: Option<usize>) -> RegressionServiceResponse {
        let horizon = horizon.unwrap_or(self.engine.params().projection_days);
        let prices = or_empty(ticker, "prices", self.market_data.price_history(ticker, self.lookback_days).await);

        let key = RegressionKey::new(ticker, &prices, horizon);
        if let Some(cached) = self.regression_cache.get(&key) {
            tracing::debug!(ticker, horizon, "regression cache hit");
            return cached;
        }

        let response = self.engine.analyze(ticker, &prices, horizon);
        if let Some(regression) = response.regression.as_ref() {
            let last_close_sigma = regression
                .historical()
                .last()
                .and_then(|p| p.sigma_distance(regression.standard_deviation));
            tracing::info!(
                ticker,
                points = prices.len(),
                horizon,
                r_squared = regression.r_squared,
                last_close_sigma,
                "regression computed"
            );
            self.regression_cache.set(key, response.clone(), self.regression_ttl);
        }
        response
    }

    /// Contextual alerts for `ticker` as of `today`
    pub async fn contextual_alerts(&self, ticker: &str, today: NaiveDate) -> Vec<ContextualAlert> {
        let key = AlertKey {
            ticker: ticker.to_uppercase(),
            today,
        };
        if let Some(cached) = self.alert_cache.get(&key) {
            tracing::debug!(ticker, "alert cache hit");
            return cached;
        }

        let (whales, dark_pool, flow) = tokio::join!(
            self.market_data.whale_trades(ticker),
            self.market_data.dark_pool_prints(ticker),
            self.market_data.flow_alerts(ticker),
        );
        let degraded = whales.is_err() || dark_pool.is_err() || flow.is_err();
        let whales = self.filter_whales(or_empty(ticker, "whale trades", whales));
        let dark_pool = or_empty(ticker, "dark pool prints", dark_pool);
        let flow = or_empty(ticker, "flow alerts", flow);

        let inputs = AlertInputs {
            whale_trades: &whales,
            dark_pool_prints: &dark_pool,
            flow_alerts: &flow,
        };
        let alerts = self.composer.compose(ticker, inputs, today);

        tracing::info!(ticker, alerts = alerts.len(), degraded, "contextual alerts composed");
        // Partial results are served but not memoized
        if !degraded {
            self.alert_cache.set(key, alerts.clone(), self.alerts_ttl);
        }
        alerts
    }

    /// Drop all memoized results
    pub fn clear_caches(&self) {
        self.regression_cache.clear();
        self.alert_cache.clear();
    }

    fn filter_whales(&self, trades: Vec<Transaction>) -> Vec<Transaction> {
        let before = trades.len();
        let kept: Vec<Transaction> = trades
            .into_iter()
            .filter(|t| t.premium >= self.filters.min_whale_premium && t.volume >= self.filters.min_whale_volume)
            .collect();
        if kept.len() < before {
            tracing::debug!(before, after = kept.len(), "whale filter applied");
        }
        kept
    }
}

fn or_empty<T>(ticker: &str, feed: &str, result: Result<Vec<T>, MarketDataError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(ticker, feed, error = %e, "fetch failed, treating as empty");
        Vec::new()
    })
}
