//! Ticker rating engine
//!
//! Turns per-ticker market data into a short-term and a long-term score and
//! ranks a universe of tickers by the long-term score.

pub mod assembler;
pub mod config;
pub mod ranker;
pub mod risk;
pub mod scoring;
pub mod universe;

#[cfg(test)]
pub(crate) mod testing;

pub use assembler::MetricsAssembler;
pub use config::RatingConfig;
pub use ranker::{rank_entries, Ranker, Ranking};
pub use risk::RiskMetricsCalculator;
pub use scoring::{long_term_score, short_term_score};
pub use universe::{parse_custom_list, NamedList, TickerUniverse};
