use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Ambiguous or no match: {0}")]
    AmbiguousOrNoMatch(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
