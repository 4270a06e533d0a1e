use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BENCHMARK: &str = "^GSPC";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingConfig {
    pub benchmark_symbol: String,      // ^GSPC (S&P 500)
    pub risk_window_days: u32,         // 30 calendar days
    pub fetch_timeout_secs: u64,       // 15
    pub max_concurrency: usize,        // 8 tickers in flight
    pub max_retries: u32,              // 2 extra attempts on 429/5xx
    pub universe_file: Option<PathBuf>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            benchmark_symbol: DEFAULT_BENCHMARK.to_string(),
            risk_window_days: 30,
            fetch_timeout_secs: 15,
            max_concurrency: 8,
            max_retries: 2,
            universe_file: None,
        }
    }
}

impl RatingConfig {
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables take the defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            benchmark_symbol: lookup("BENCHMARK_SYMBOL")
                .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string()),
            risk_window_days: parse_var(&lookup, "RISK_WINDOW_DAYS", "30")?,
            fetch_timeout_secs: parse_var(&lookup, "FETCH_TIMEOUT_SECS", "15")?,
            max_concurrency: parse_var(&lookup, "MAX_CONCURRENCY", "8")?,
            max_retries: parse_var(&lookup, "YAHOO_MAX_RETRIES", "2")?,
            universe_file: lookup("UNIVERSE_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.benchmark_symbol.trim().is_empty() {
            return Err(AnalysisError::Config("BENCHMARK_SYMBOL must not be empty".to_string()));
        }
        // Two closes give a single return; alpha and beta need at least two.
        if self.risk_window_days < 2 {
            return Err(AnalysisError::Config(format!(
                "RISK_WINDOW_DAYS must be at least 2, got {}",
                self.risk_window_days
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(AnalysisError::Config("FETCH_TIMEOUT_SECS must be positive".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(AnalysisError::Config("MAX_CONCURRENCY must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Deadline for one HTTP attempt. Every attempt plus one share of backoff
    /// fits inside `fetch_timeout`, so retries run before the fetch is cut off.
    pub fn attempt_timeout(&self) -> Duration {
        self.fetch_timeout() / self.max_retries.saturating_add(2)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, AnalysisError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| AnalysisError::Config(format!("{}={:?}: {}", key, raw, e)))
}
