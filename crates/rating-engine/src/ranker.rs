//! Concurrent scoring of a ticker batch, ordered by long-term score.

use analysis_core::{AnalysisError, RankedEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::assembler::MetricsAssembler;
use crate::scoring::{long_term_score, short_term_score};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    /// Best long-term score first.
    pub entries: Vec<RankedEntry>,
    pub total_requested: usize,
    pub total_failed: usize,
    pub timestamp: DateTime<Utc>,
}

pub struct Ranker {
    assembler: Arc<MetricsAssembler>,
    max_concurrency: usize,
}

impl Ranker {
    pub fn new(assembler: Arc<MetricsAssembler>, max_concurrency: usize) -> Self {
        Self {
            assembler,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Evaluate every ticker and rank the ones that could be scored. Tickers
    /// whose data is unavailable are logged and left out.
    pub async fn evaluate(&self, tickers: &[String]) -> Ranking {
        let total_requested = tickers.len();
        tracing::info!(
            "Rating {} tickers ({} at a time)",
            total_requested,
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, ticker) in tickers.iter().cloned().enumerate() {
            let assembler = Arc::clone(&self.assembler);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = evaluate_ticker(&assembler, &ticker).await;
                (index, ticker, result)
            });
        }

        // Slot results by input position so completion order cannot leak into ties.
        let mut slots: Vec<Option<RankedEntry>> = vec![None; total_requested];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(entry))) => {
                    slots[index] = Some(entry);
                }
                Ok((_, ticker, Err(e))) => {
                    tracing::warn!("Skipping {}: {}", ticker, e);
                }
                Err(e) => {
                    tracing::error!("Rating task error: {}", e);
                }
            }
        }

        let entries = rank_entries(slots.into_iter().flatten().collect());
        let total_failed = total_requested - entries.len();

        tracing::info!(
            "Rating complete: {}/{} tickers ranked, {} skipped",
            entries.len(),
            total_requested,
            total_failed
        );

        Ranking {
            entries,
            total_requested,
            total_failed,
            timestamp: Utc::now(),
        }
    }
}

/// Assemble and score a single ticker.
pub async fn evaluate_ticker(
    assembler: &MetricsAssembler,
    ticker: &str,
) -> Result<RankedEntry, AnalysisError> {
    let record = assembler.assemble(ticker).await?;

    Ok(RankedEntry {
        short_term_score: short_term_score(&record),
        long_term_score: long_term_score(&record),
        name: record.name,
        ticker: ticker.to_string(),
    })
}

/// Sort by long-term score, highest first. The sort is stable, so equal scores
/// keep their evaluation order.
pub fn rank_entries(mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| {
        b.long_term_score
            .partial_cmp(&a.long_term_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}
