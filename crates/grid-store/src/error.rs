use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
