use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The minimal record for a ticker could not be built. Callers that rank a
    /// universe drop the ticker instead of aborting.
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    /// The provider rejected the session (HTTP 401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        AnalysisError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// Collapse any provider-level fault into `DataUnavailable` for `symbol`.
    pub fn into_unavailable(self, symbol: &str) -> Self {
        match self {
            e @ AnalysisError::DataUnavailable { .. } => e,
            other => AnalysisError::data_unavailable(symbol, other.to_string()),
        }
    }
}
