use grid_query::QueryError;
use grid_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid table config: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The exact filtered count failed after the page itself was read.
    #[error("filtered count failed: {0}")]
    CountFailed(#[source] StoreError),
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl TableError {
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            TableError::InvalidInput(_) => http::StatusCode::BAD_REQUEST,
            TableError::Store(StoreError::Unavailable(_))
            | TableError::CountFailed(StoreError::Unavailable(_)) => http::StatusCode::BAD_GATEWAY,
            TableError::Cancelled => http::StatusCode::SERVICE_UNAVAILABLE,
            TableError::DeadlineExceeded => http::StatusCode::GATEWAY_TIMEOUT,
            TableError::Config(_) | TableError::Store(_) | TableError::CountFailed(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<QueryError> for TableError {
    fn from(e: QueryError) -> Self {
        TableError::InvalidInput(e.to_string())
    }
}
