use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PulseError {
    #[error("Invalid odds field: {0}")]
    InvalidOddsField(String),

    #[error("Invalid sort key: {0}")]
    InvalidSortKey(String),

    #[error("Invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("Invalid update interval: {interval_ms}ms, must be greater than zero")]
    InvalidInterval { interval_ms: u64 },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PulseError>;
