use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display name used when the provider has no short name for a ticker.
pub const UNKNOWN_NAME: &str = "Unknown Name";

/// Daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Point-in-time fundamentals snapshot.
///
/// Ratios and growth rates are fractional (0.12 = 12%) except `debt_to_equity`,
/// which is passed through in whatever unit the provider reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub short_name: Option<String>,
    pub trailing_pe: Option<f64>,
    pub fifty_day_average: Option<f64>,
    pub two_hundred_day_average: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub free_cashflow: Option<f64>,
}

/// Beta and alpha against the benchmark. Both are derived from the same paired
/// return series, so they are either both known or both unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RiskMetrics {
    Available {
        beta: f64,
        /// Cumulative return spread over the benchmark, in percentage points.
        alpha: f64,
    },
    Unavailable,
}

impl RiskMetrics {
    pub fn beta(&self) -> Option<f64> {
        match self {
            RiskMetrics::Available { beta, .. } => Some(*beta),
            RiskMetrics::Unavailable => None,
        }
    }

    pub fn alpha(&self) -> Option<f64> {
        match self {
            RiskMetrics::Available { alpha, .. } => Some(*alpha),
            RiskMetrics::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RiskMetrics::Available { .. })
    }
}

/// Everything the scorers look at for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub name: String,
    /// Most recent close.
    pub price: f64,
    pub pe_ratio: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub moving_avg_50: Option<f64>,
    pub moving_avg_200: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub free_cash_flow_growth: Option<f64>,
    /// Short-term volatility. Nothing populates this yet; the short-term
    /// scorer penalizes it when present.
    #[serde(default)]
    pub volatility: Option<f64>,
}

impl MetricsRecord {
    /// A record carrying only a price; every optional metric is absent.
    pub fn with_price(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            pe_ratio: None,
            alpha: None,
            beta: None,
            moving_avg_50: None,
            moving_avg_200: None,
            revenue_growth: None,
            earnings_growth: None,
            dividend_yield: None,
            debt_to_equity: None,
            free_cash_flow_growth: None,
            volatility: None,
        }
    }
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub ticker: String,
    pub short_term_score: f64,
    pub long_term_score: f64,
}
