//! Log-Linear Regression Channel
//!
//! Fits a trend line to an ordered price series in log-price space and
//! derives sigma bands around it:
//!
//! - y = ln(max(close, price_floor)), x = index
//! - slope = (nΣxy - ΣxΣy) / (nΣx² - (Σx)²)
//! - intercept = (Σy - slope·Σx) / n
//! - σ = sqrt(SSres / (n - 2)), all in log space
//!
//! Bands are exp(predicted ± k·σ), so they are multiplicative in price
//! space: symmetric in log returns, not in dollars.
//!
//! The fitted line can be continued past the last observation; projected
//! dates come from a pluggable `DateStepper`.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

use crate::analytics::error::AnalyticsError;
use crate::analytics::params::{ProjectionCalendar, RegressionParams, MAX_PROJECTION_STEPS};
use crate::domain::PricePoint;

/// Sums of squares below this are treated as zero variance
const MIN_VARIANCE: f64 = 1e-18;

/// Advances a projected date by one step
pub trait DateStepper: fmt::Debug + Send + Sync {
    fn step(&self, date: NaiveDate) -> NaiveDate;
}

/// One calendar day per step; weekends and holidays are not skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarDays;

impl DateStepper for CalendarDays {
    fn step(&self, date: NaiveDate) -> NaiveDate {
        date.succ_opt().unwrap_or(date)
    }
}

/// Next Monday-to-Friday date; no holiday calendar
#[derive(Debug, Clone, Copy, Default)]
pub struct Weekdays;

impl DateStepper for Weekdays {
    fn step(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date.succ_opt().unwrap_or(date);
        while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
            match next.succ_opt() {
                Some(d) => next = d,
                None => break,
            }
        }
        next
    }
}

impl ProjectionCalendar {
    /// Stepper implementing this calendar
    pub fn stepper(&self) -> Box<dyn DateStepper> {
        match self {
            ProjectionCalendar::Calendar => Box::new(CalendarDays),
            ProjectionCalendar::Weekdays => Box::new(Weekdays),
        }
    }
}

/// A fitted (and optionally observed) point on the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionPoint {
    pub date: NaiveDate,
    /// Observed close; `None` for projected points
    pub price: Option<f64>,
    /// Fitted trend value
    pub regression: f64,
    pub plus_1_sigma: f64,
    pub plus_2_sigma: f64,
    pub minus_1_sigma: f64,
    pub minus_2_sigma: f64,
    /// True when the point lies past the last observation
    #[serde(default)]
    pub projected: bool,
}

impl RegressionPoint {
    fn from_log(date: NaiveDate, price: Option<f64>, predicted_log: f64, sigma: f64) -> Self {
        Self {
            date,
            price,
            regression: predicted_log.exp(),
            plus_1_sigma: (predicted_log + sigma).exp(),
            plus_2_sigma: (predicted_log + 2.0 * sigma).exp(),
            minus_1_sigma: (predicted_log - sigma).exp(),
            minus_2_sigma: (predicted_log - 2.0 * sigma).exp(),
            projected: price.is_none(),
        }
    }

    /// Signed distance of the observed price from the trend, in σ units
    pub fn sigma_distance(&self, standard_deviation: f64) -> Option<f64> {
        let price = self.price?;
        if standard_deviation <= 0.0 || price <= 0.0 {
            return None;
        }
        Some((price.ln() - self.regression.ln()) / standard_deviation)
    }
}

/// A fitted log-linear trend channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Slope per step, in log-price space
    pub slope: f64,
    /// Intercept, in log-price space
    pub intercept: f64,
    pub r_squared: f64,
    /// Residual standard deviation, in log-price space
    pub standard_deviation: f64,
    /// Observed points followed by projected points
    pub points: Vec<RegressionPoint>,
}

impl RegressionResult {
    /// Fitted price at an index (0 = first observation)
    pub fn fitted_at(&self, index: usize) -> f64 {
        (self.slope * index as f64 + self.intercept).exp()
    }

    /// Growth per step implied by the slope (0.1 = +10% per step)
    pub fn growth_per_step(&self) -> f64 {
        self.slope.exp() - 1.0
    }

    pub fn historical(&self) -> impl Iterator<Item = &RegressionPoint> {
        self.points.iter().filter(|p| !p.projected)
    }

    pub fn projection(&self) -> impl Iterator<Item = &RegressionPoint> {
        self.points.iter().filter(|p| p.projected)
    }
}

/// Regression result as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionServiceResponse {
    pub success: bool,
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub points: Vec<RegressionPoint>,
    pub regression: Option<RegressionResult>,
}

impl RegressionServiceResponse {
    pub fn ok(ticker: impl Into<String>, result: RegressionResult) -> Self {
        Self {
            success: true,
            ticker: ticker.into(),
            timestamp: Utc::now(),
            error: None,
            points: result.points.clone(),
            regression: Some(result),
        }
    }

    pub fn failure(ticker: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            ticker: ticker.into(),
            timestamp: Utc::now(),
            error: Some(error.to_string()),
            points: Vec::new(),
            regression: None,
        }
    }
}

/// Raw least-squares fit over log prices
#[derive(Debug, Clone, Copy, PartialEq)]
struct LogLinearFit {
    slope: f64,
    intercept: f64,
    r_squared: f64,
    standard_deviation: f64,
}

fn fit_log_linear(log_prices: &[f64]) -> LogLinearFit {
    let n = log_prices.len() as f64;

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in log_prices.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    let slope = if denominator == 0.0 {
        0.0
    } else {
        (n * sum_xy - sum_x * sum_y) / denominator
    };
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = log_prices.iter().mean();
    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for (i, &y) in log_prices.iter().enumerate() {
        let predicted = slope * i as f64 + intercept;
        ss_tot += (y - mean_y).powi(2);
        ss_res += (y - predicted).powi(2);
    }

    let r_squared = if ss_tot <= MIN_VARIANCE {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    let standard_deviation = if log_prices.len() < 3 {
        0.0
    } else {
        (ss_res / (n - 2.0)).sqrt()
    };

    LogLinearFit {
        slope,
        intercept,
        r_squared,
        standard_deviation,
    }
}

/// Log-linear regression channel engine
#[derive(Debug)]
pub struct RegressionEngine {
    params: RegressionParams,
    stepper: Box<dyn DateStepper>,
}

impl RegressionEngine {
    /// Create an engine; the date stepper follows `params.calendar`
    pub fn new(params: RegressionParams) -> Self {
        let stepper = params.calendar.stepper();
        Self { params, stepper }
    }

    /// Replace the projection date stepper
    pub fn with_stepper(mut self, stepper: Box<dyn DateStepper>) -> Self {
        self.stepper = stepper;
        self
    }

    pub fn params(&self) -> &RegressionParams {
        &self.params
    }

    /// Fit the channel and project `horizon` steps past the last price
    pub fn fit(&self, prices: &[PricePoint], horizon: usize) -> Result<RegressionResult, AnalyticsError> {
        if horizon > MAX_PROJECTION_STEPS {
            return Err(AnalyticsError::InvalidParameter(format!(
                "projection horizon {horizon} exceeds {MAX_PROJECTION_STEPS} steps"
            )));
        }

        let required = self.params.min_points.max(2);
        if prices.len() < required {
            return Err(AnalyticsError::InsufficientData {
                required,
                got: prices.len(),
            });
        }

        let floor = self.params.price_floor;
        let log_prices: Vec<f64> = prices.iter().map(|p| p.close.max(floor).ln()).collect();
        let fit = fit_log_linear(&log_prices);

        let n = prices.len();
        let sigma = fit.standard_deviation;
        let capacity = n.checked_add(horizon).ok_or_else(|| {
            AnalyticsError::InvalidParameter(format!("{n} points plus {horizon} projected steps overflow"))
        })?;
        let mut points = Vec::with_capacity(capacity);

        for (i, price) in prices.iter().enumerate() {
            let predicted_log = fit.slope * i as f64 + fit.intercept;
            points.push(RegressionPoint::from_log(price.date, Some(price.close), predicted_log, sigma));
        }

        // n >= 2 here
        let mut date = prices[n - 1].date;
        for step in 0..horizon {
            date = self.stepper.step(date);
            let predicted_log = fit.slope * (n + step) as f64 + fit.intercept;
            points.push(RegressionPoint::from_log(date, None, predicted_log, sigma));
        }

        tracing::debug!(
            points = n,
            horizon,
            slope = fit.slope,
            r_squared = fit.r_squared,
            sigma,
            "fitted log-linear channel"
        );

        Ok(RegressionResult {
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            standard_deviation: sigma,
            points,
        })
    }

    /// Fit with the configured default horizon
    pub fn fit_default(&self, prices: &[PricePoint]) -> Result<RegressionResult, AnalyticsError> {
        self.fit(prices, self.params.projection_days)
    }

    /// Fit and wrap the outcome; never fails
    pub fn analyze(&self, ticker: &str, prices: &[PricePoint], horizon: usize) -> RegressionServiceResponse {
        if prices.is_empty() {
            return RegressionServiceResponse::failure(ticker, format!("No price data available for {ticker}"));
        }
        match self.fit(prices, horizon) {
            Ok(result) => RegressionServiceResponse::ok(ticker, result),
            Err(e) => {
                tracing::warn!(ticker, error = %e, "regression failed");
                RegressionServiceResponse::failure(ticker, e)
            }
        }
    }
}

impl Default for RegressionEngine {
    fn default() -> Self {
        Self::new(RegressionParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap() + chrono::Duration::days(offset)
    }

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(date(i as i64), c))
            .collect()
    }

    /// Deterministic noisy exponential series
    fn noisy_series(n: usize, rate: f64, noise: f64) -> Vec<PricePoint> {
        let mut state = 12345u64;
        (0..n)
            .map(|i| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                let u = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
                let close = 50.0 * (rate * i as f64 + noise * u).exp();
                PricePoint::new(date(i as i64), close)
            })
            .collect()
    }

    #[test]
    fn test_known_growth_series() {
        let engine = RegressionEngine::default();
        let result = engine.fit(&series(&[10.0, 11.0, 12.1, 13.3, 14.6]), 0).unwrap();

        assert_relative_eq!(result.slope, 1.1_f64.ln(), epsilon = 0.002);
        let last = result.points[4].regression;
        assert!((last - 14.6).abs() / 14.6 < 0.02, "regression[4] = {last}");
        assert!(result.r_squared > 0.99);
    }

    #[test]
    fn test_exact_exponential_series() {
        let rate = 0.02;
        let closes: Vec<f64> = (0..60).map(|i| 25.0 * (rate * i as f64).exp()).collect();
        let result = RegressionEngine::default().fit(&series(&closes), 0).unwrap();

        assert_relative_eq!(result.slope, rate, epsilon = 1e-9);
        assert_relative_eq!(result.intercept, 25.0_f64.ln(), epsilon = 1e-9);
        assert_relative_eq!(result.r_squared, 1.0, epsilon = 1e-9);
        assert!(result.standard_deviation < 1e-9);
    }

    #[test]
    fn test_regression_values_positive() {
        let prices = noisy_series(120, -0.01, 0.4);
        let result = RegressionEngine::default().fit(&prices, 20).unwrap();
        assert!(result.points.iter().all(|p| p.regression > 0.0));
        assert!(result.points.iter().all(|p| p.minus_2_sigma > 0.0));
    }

    #[test]
    fn test_band_ordering() {
        let prices = noisy_series(80, 0.005, 0.2);
        let result = RegressionEngine::default().fit(&prices, 10).unwrap();
        assert!(result.standard_deviation > 0.0);

        for p in &result.points {
            assert!(p.minus_2_sigma < p.minus_1_sigma);
            assert!(p.minus_1_sigma < p.regression);
            assert!(p.regression < p.plus_1_sigma);
            assert!(p.plus_1_sigma < p.plus_2_sigma);
        }
    }

    #[test]
    fn test_bands_multiplicative() {
        let prices = noisy_series(40, 0.01, 0.3);
        let result = RegressionEngine::default().fit(&prices, 0).unwrap();

        let p = &result.points[10];
        let up = p.plus_1_sigma / p.regression;
        let down = p.regression / p.minus_1_sigma;
        assert_relative_eq!(up, down, epsilon = 1e-9);
        assert_relative_eq!(up, result.standard_deviation.exp(), epsilon = 1e-9);
        // Dollar distance above the trend is wider than below it
        assert!(p.plus_1_sigma - p.regression > p.regression - p.minus_1_sigma);
    }

    #[test]
    fn test_two_points_has_zero_sigma() {
        let result = RegressionEngine::default().fit(&series(&[100.0, 110.0]), 0).unwrap();
        assert_eq!(result.standard_deviation, 0.0);
        assert_relative_eq!(result.slope, 1.1_f64.ln(), epsilon = 1e-12);
        let p = &result.points[1];
        assert_eq!(p.plus_2_sigma, p.regression);
        assert_eq!(p.minus_2_sigma, p.regression);
    }

    #[test]
    fn test_constant_series_r_squared_zero() {
        let result = RegressionEngine::default().fit(&series(&[42.0; 10]), 0).unwrap();
        assert_eq!(result.r_squared, 0.0);
        assert!(result.slope.abs() < 1e-12);
        assert_relative_eq!(result.points[9].regression, 42.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_price_is_floored() {
        let result = RegressionEngine::default().fit(&series(&[1.0, 0.0, 1.0, 1.0]), 0).unwrap();
        assert!(result.slope.is_finite());
        assert!(result.intercept.is_finite());
        assert!(result.points.iter().all(|p| p.regression.is_finite() && p.regression > 0.0));
        // Observed price is reported unfloored
        assert_eq!(result.points[1].price, Some(0.0));
    }

    #[test]
    fn test_projection_continues_line() {
        let prices = series(&[10.0, 11.0, 12.1, 13.3, 14.6]);
        let result = RegressionEngine::default().fit(&prices, 3).unwrap();

        assert_eq!(result.points.len(), 8);
        assert_eq!(result.historical().count(), 5);
        assert_eq!(result.projection().count(), 3);

        let projected: Vec<_> = result.projection().collect();
        assert_eq!(projected[0].date, date(5));
        assert_eq!(projected[2].date, date(7));
        assert!(projected.iter().all(|p| p.price.is_none()));
        assert_relative_eq!(projected[2].regression, result.fitted_at(7), epsilon = 1e-9);
        assert!(projected[2].regression > projected[0].regression);
    }

    #[test]
    fn test_weekday_projection_skips_weekends() {
        // 2026-01-09 is a Friday
        let friday = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        let prices = vec![
            PricePoint::new(friday - chrono::Duration::days(1), 10.0),
            PricePoint::new(friday, 10.5),
        ];
        let mut params = RegressionParams::default();
        params.calendar = ProjectionCalendar::Weekdays;
        let result = RegressionEngine::new(params).fit(&prices, 2).unwrap();

        let projected: Vec<_> = result.projection().map(|p| p.date).collect();
        assert_eq!(projected[0], NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(projected[1], NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
    }

    #[test]
    fn test_calendar_projection_does_not_skip_weekends() {
        let friday = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert_eq!(CalendarDays.step(friday), NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
    }

    #[test]
    fn test_insufficient_data() {
        let engine = RegressionEngine::default();
        let err = engine.fit(&series(&[10.0]), 5).unwrap_err();
        assert_eq!(err, AnalyticsError::InsufficientData { required: 2, got: 1 });
    }

    #[test]
    fn test_analyze_empty_series() {
        let response = RegressionEngine::default().analyze("AAPL", &[], 30);
        assert!(!response.success);
        assert_eq!(response.ticker, "AAPL");
        assert!(response.error.unwrap().contains("AAPL"));
        assert!(response.points.is_empty());
        assert!(response.regression.is_none());
    }

    #[test]
    fn test_analyze_success() {
        let response = RegressionEngine::default().analyze("MSFT", &noisy_series(30, 0.01, 0.1), 5);
        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.points.len(), 35);
        assert_eq!(response.regression.unwrap().points.len(), 35);
    }

    #[test]
    fn test_horizon_is_bounded() {
        let engine = RegressionEngine::default();
        let prices = series(&[10.0, 11.0]);

        let err = engine.fit(&prices, MAX_PROJECTION_STEPS + 1).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter(_)));
        assert_eq!(engine.fit(&prices, MAX_PROJECTION_STEPS).unwrap().points.len(), 2 + MAX_PROJECTION_STEPS);

        let response = engine.analyze("X", &prices, usize::MAX);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("horizon"));
        assert!(response.points.is_empty());
    }

    #[test]
    fn test_sigma_distance() {
        let prices = noisy_series(50, 0.0, 0.3);
        let result = RegressionEngine::default().fit(&prices, 1).unwrap();
        let sd = result.standard_deviation;

        let observed = &result.points[0];
        let distance = observed.sigma_distance(sd).unwrap();
        let expected = (prices[0].close.ln() - observed.regression.ln()) / sd;
        assert_relative_eq!(distance, expected, epsilon = 1e-12);

        let projected = result.points.last().unwrap();
        assert!(projected.sigma_distance(sd).is_none());
    }
}
