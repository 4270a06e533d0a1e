//! Alpha and beta against a benchmark index.

use analysis_core::{MarketDataProvider, PricePoint, RiskMetrics};
use chrono::{Days, NaiveDate};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::time::Duration;

use crate::assembler::with_timeout;

/// Fractional change between two consecutive closes, dated at the later close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedReturn {
    pub date: NaiveDate,
    pub value: f64,
}

/// Compute daily returns from a price history. The first close has no return;
/// a zero previous close yields none either.
pub fn daily_returns(prices: &[PricePoint]) -> Vec<DatedReturn> {
    prices
        .windows(2)
        .filter_map(|w| {
            if w[0].close != 0.0 {
                Some(DatedReturn {
                    date: w[1].date,
                    value: (w[1].close - w[0].close) / w[0].close,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Compounded return of a return series: Π(1 + r) − 1.
pub fn cumulative_return(returns: &[f64]) -> f64 {
    returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
}

#[derive(Debug, Clone)]
pub struct RiskMetricsCalculator {
    window_days: u32,
}

impl Default for RiskMetricsCalculator {
    fn default() -> Self {
        Self::new(30)
    }
}

impl RiskMetricsCalculator {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Trailing calendar window ending at `today`. Asset and benchmark histories
    /// must both come from this window so their returns line up by date.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.window_days)))
            .unwrap_or(today);
        (start, today)
    }

    pub fn compute(&self, asset: &[PricePoint], benchmark: &[PricePoint]) -> RiskMetrics {
        let asset_returns = daily_returns(asset);
        let bench_returns = daily_returns(benchmark);

        if asset_returns.len() < 2 || bench_returns.len() < 2 {
            return RiskMetrics::Unavailable;
        }

        let bench_by_date: HashMap<NaiveDate, f64> =
            bench_returns.iter().map(|r| (r.date, r.value)).collect();
        let (paired_asset, paired_bench): (Vec<f64>, Vec<f64>) = asset_returns
            .iter()
            .filter_map(|r| bench_by_date.get(&r.date).map(|b| (r.value, *b)))
            .unzip();

        if paired_asset.len() < 2 {
            return RiskMetrics::Unavailable;
        }

        let asset_values: Vec<f64> = asset_returns.iter().map(|r| r.value).collect();
        let bench_values: Vec<f64> = bench_returns.iter().map(|r| r.value).collect();

        // Covariance over shared dates, variance over the whole benchmark series.
        let variance = bench_values.iter().variance();
        let beta = if variance == 0.0 {
            0.0
        } else {
            paired_asset.iter().covariance(paired_bench.iter()) / variance
        };

        let alpha = (cumulative_return(&asset_values) - cumulative_return(&bench_values)) * 100.0;

        if !beta.is_finite() || !alpha.is_finite() {
            return RiskMetrics::Unavailable;
        }

        RiskMetrics::Available { beta, alpha }
    }

    /// Fetch the benchmark history for the window ending at `today` and compute
    /// against `asset`. A failed or slow benchmark fetch only costs the ticker
    /// its alpha and beta.
    pub async fn fetch_and_compute(
        &self,
        provider: &dyn MarketDataProvider,
        benchmark_symbol: &str,
        asset: &[PricePoint],
        today: NaiveDate,
        fetch_timeout: Duration,
    ) -> RiskMetrics {
        let (start, end) = self.window(today);
        let benchmark = with_timeout(
            benchmark_symbol,
            fetch_timeout,
            provider.price_history(benchmark_symbol, start, end),
        )
        .await;

        match benchmark {
            Ok(benchmark) => self.compute(asset, &benchmark),
            Err(e) => {
                tracing::debug!("Benchmark {} unavailable, skipping alpha/beta: {}", benchmark_symbol, e);
                RiskMetrics::Unavailable
            }
        }
    }
}
