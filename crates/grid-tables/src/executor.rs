use std::sync::Arc;
use std::time::Duration;

use bson::Document;
use grid_query::Query;
use grid_store::DocumentStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::count::CountEngine;
use crate::error::TableError;
use crate::plan::{ExecutionPlan, Strategy, explain};

/// One page of raw documents plus both counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Document>,
    /// Approximate size of the whole collection.
    pub total: u64,
    /// Exact match count, or `total` when nothing narrowed the result.
    pub filtered: u64,
}

/// Runs a compiled query against the store. Holds nothing between requests
/// except the store handle.
pub struct PaginationExecutor<S: ?Sized> {
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S: DocumentStore + ?Sized> PaginationExecutor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read one page and its counts. The data read and both counts run
    /// concurrently; the first failure, a cancellation or the deadline aborts
    /// the rest and no partial page is returned.
    #[instrument(skip_all, fields(table = %query.table))]
    pub async fn execute(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<Page, TableError> {
        query.validate()?;
        let plan = explain(query);
        debug!(
            strategy = strategy_name(&plan.strategy),
            exact_count = plan.count.is_some(),
            "executing plan"
        );

        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, self.run(&plan)).await {
                    Ok(result) => result,
                    Err(_) => Err(TableError::DeadlineExceeded),
                },
                None => self.run(&plan).await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TableError::Cancelled),
            result = bounded => result,
        }
    }

    async fn run(&self, plan: &ExecutionPlan) -> Result<Page, TableError> {
        let collection = plan.collection.as_str();
        let counts = CountEngine::new(self.store.as_ref(), collection);

        let rows = async {
            let docs = match &plan.strategy {
                Strategy::Find { filter, options } => {
                    self.store.find(collection, filter, options).await?
                }
                Strategy::Aggregate { pipeline } => {
                    self.store.aggregate(collection, pipeline).await?
                }
            };
            Ok::<_, TableError>(docs)
        };

        let (rows, total, filtered) =
            tokio::try_join!(rows, counts.total(), counts.filtered(plan.count.as_ref()))?;

        debug!(rows = rows.len(), total, ?filtered, "page read");
        Ok(Page {
            rows,
            total,
            filtered: filtered.unwrap_or(total),
        })
    }
}

fn strategy_name(strategy: &Strategy) -> &'static str {
    match strategy {
        Strategy::Find { .. } => "find",
        Strategy::Aggregate { .. } => "aggregate",
    }
}
