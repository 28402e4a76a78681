//! Search error taxonomy

use sshvanity_pattern::PatternError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Rejected at construction; the caller may retry with other patterns
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,
    /// Fatal for the session that hit it
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}
