use analysis_core::{
    AnalysisError, Fundamentals, MarketDataProvider, MetricsRecord, RiskMetrics, UNKNOWN_NAME,
};
use chrono::{NaiveDate, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RatingConfig;
use crate::risk::RiskMetricsCalculator;

/// Run a provider call with a deadline. Expiry is reported as `Timeout`.
pub(crate) async fn with_timeout<T, F>(
    symbol: &str,
    limit: Duration,
    fut: F,
) -> Result<T, AnalysisError>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AnalysisError::Timeout(format!(
            "{} did not respond within {:?}",
            symbol, limit
        ))),
    }
}

/// Builds one `MetricsRecord` per ticker from provider data.
pub struct MetricsAssembler {
    provider: Arc<dyn MarketDataProvider>,
    risk: RiskMetricsCalculator,
    benchmark_symbol: String,
    fetch_timeout: Duration,
}

impl MetricsAssembler {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &RatingConfig) -> Self {
        Self {
            provider,
            risk: RiskMetricsCalculator::new(config.risk_window_days),
            benchmark_symbol: config.benchmark_symbol.clone(),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    pub async fn assemble(&self, ticker: &str) -> Result<MetricsRecord, AnalysisError> {
        self.assemble_on(ticker, Utc::now().date_naive()).await
    }

    /// Assemble as of `today`. Issues one asset history fetch, one fundamentals
    /// fetch and one benchmark history fetch.
    pub async fn assemble_on(
        &self,
        ticker: &str,
        today: NaiveDate,
    ) -> Result<MetricsRecord, AnalysisError> {
        let (start, end) = self.risk.window(today);

        let history = with_timeout(
            ticker,
            self.fetch_timeout,
            self.provider.price_history(ticker, start, end),
        )
        .await
        .map_err(|e| e.into_unavailable(ticker))?;

        let price = match history.last() {
            Some(point) if point.close.is_finite() && point.close >= 0.0 => point.close,
            Some(point) => {
                return Err(AnalysisError::data_unavailable(
                    ticker,
                    format!("invalid latest close {}", point.close),
                ))
            }
            None => return Err(AnalysisError::data_unavailable(ticker, "no price history")),
        };

        let fundamentals = with_timeout(ticker, self.fetch_timeout, self.provider.fundamentals(ticker))
            .await
            .map_err(|e| e.into_unavailable(ticker))?;

        let risk = self
            .risk
            .fetch_and_compute(
                self.provider.as_ref(),
                &self.benchmark_symbol,
                &history,
                today,
                self.fetch_timeout,
            )
            .await;

        Ok(build_record(fundamentals, price, risk))
    }
}

/// Combine a fundamentals snapshot, the latest close and risk metrics into a
/// record, applying the fallbacks for missing fields.
pub fn build_record(fundamentals: Fundamentals, price: f64, risk: RiskMetrics) -> MetricsRecord {
    let revenue_growth = fundamentals.revenue_growth.unwrap_or(0.0);
    let earnings_growth = fundamentals.earnings_growth.unwrap_or(0.0);

    // Free cash flow scaled by revenue growth when both are usable, otherwise
    // the raw free cash flow figure.
    let free_cash_flow_growth = match fundamentals.free_cashflow {
        Some(fcf) if fcf != 0.0 && revenue_growth != 0.0 => (fcf / revenue_growth) * 100.0,
        Some(fcf) => fcf,
        None => 0.0,
    };

    MetricsRecord {
        name: fundamentals
            .short_name
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        price,
        pe_ratio: fundamentals.trailing_pe,
        alpha: risk.alpha(),
        beta: risk.beta(),
        moving_avg_50: fundamentals.fifty_day_average,
        moving_avg_200: fundamentals.two_hundred_day_average,
        revenue_growth: Some(revenue_growth),
        earnings_growth: Some(earnings_growth),
        dividend_yield: fundamentals.dividend_yield,
        debt_to_equity: fundamentals.debt_to_equity,
        free_cash_flow_growth: Some(free_cash_flow_growth),
        volatility: None,
    }
}
