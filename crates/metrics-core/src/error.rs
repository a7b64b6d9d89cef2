use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}
