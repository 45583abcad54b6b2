use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query has no table")]
    MissingTable,
    #[error("invalid field path: {0:?}")]
    InvalidField(String),
    #[error("invalid sort field: {0:?}")]
    InvalidSort(String),
    #[error("invalid page window: offset {offset}, limit {limit}")]
    InvalidWindow { offset: u64, limit: u64 },
}
