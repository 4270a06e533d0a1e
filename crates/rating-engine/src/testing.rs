//! In-memory market data for tests.

use analysis_core::{AnalysisError, Fundamentals, MarketDataProvider, PricePoint};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Consecutive daily closes starting 2024-03-01.
pub fn prices(closes: &[f64]) -> Vec<PricePoint> {
    let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| PricePoint::new(first.checked_add_days(Days::new(i as u64)).unwrap(), *close))
        .collect()
}

/// Price history whose daily returns are exactly `returns`.
pub fn history_from_returns(start: f64, returns: &[f64]) -> Vec<PricePoint> {
    let mut closes = vec![start];
    for r in returns {
        let last = *closes.last().unwrap();
        closes.push(last * (1.0 + r));
    }
    prices(&closes)
}

/// Serves fixed histories regardless of the requested window. Unknown symbols
/// have no history; fundamentals default to an empty snapshot.
#[derive(Default)]
pub struct StaticProvider {
    histories: HashMap<String, Vec<PricePoint>>,
    fundamentals: HashMap<String, Fundamentals>,
    failing_fundamentals: HashSet<String>,
    delay: Option<Duration>,
    history_calls: Mutex<HashMap<String, usize>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.histories.insert(symbol.to_string(), prices(closes));
        self
    }

    pub fn with_price_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.histories.insert(symbol.to_string(), points);
        self
    }

    pub fn with_fundamentals(mut self, symbol: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(symbol.to_string(), fundamentals);
        self
    }

    pub fn with_failing_fundamentals(mut self, symbol: &str) -> Self {
        self.failing_fundamentals.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn history_calls(&self, symbol: &str) -> usize {
        self.history_calls
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    async fn price_history(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        *self
            .history_calls
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.histories
            .get(symbol)
            .cloned()
            .ok_or_else(|| AnalysisError::ApiError(format!("HTTP 404: no chart for {}", symbol)))
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, AnalysisError> {
        if self.failing_fundamentals.contains(symbol) {
            return Err(AnalysisError::InvalidData(format!("bad quoteSummary for {}", symbol)));
        }
        Ok(self.fundamentals.get(symbol).cloned().unwrap_or_default())
    }
}
