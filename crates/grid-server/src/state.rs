use std::sync::Arc;

use grid_store::MemoryStore;
use grid_tables::TableHttp;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub table: Arc<TableHttp<MemoryStore>>,
    /// Cancelled on shutdown. Each request runs under a child token.
    pub shutdown: CancellationToken,
}
