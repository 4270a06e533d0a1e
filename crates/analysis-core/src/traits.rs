use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{AnalysisError, Fundamentals, PricePoint};

/// Source of price histories and fundamentals snapshots.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closes for `symbol` between `start` and `end`, oldest first.
    async fn price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError>;

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, AnalysisError>;
}
