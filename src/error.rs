use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum OracleError {
    #[error("Quorum not reached: {valid} valid signatures, {required} required")]
    QuorumNotReached { valid: usize, required: usize },

    #[error("No oracle responses to aggregate")]
    EmptyBatch,

    #[error("Oracle signing error: {0}")]
    Signing(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("Coverage amount must be positive for policy {0}")]
    ZeroCoverage(String),

    #[error("Thresholds must be finite for policy {0}")]
    NonFiniteThreshold(String),

    #[error("Premium rate must be within [0, 1], got {0}")]
    InvalidRate(f64),
}

pub type Result<T> = std::result::Result<T, OracleError>;
