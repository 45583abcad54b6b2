use bson::{Bson, Document};
use grid_store::DocumentStore;
use tracing::debug;

use crate::error::TableError;
use crate::plan::{COUNT_FIELD, CountPlan};

/// Total and filtered counts for one collection.
pub struct CountEngine<'a, S: ?Sized> {
    store: &'a S,
    collection: &'a str,
}

impl<'a, S: DocumentStore + ?Sized> CountEngine<'a, S> {
    pub fn new(store: &'a S, collection: &'a str) -> Self {
        Self { store, collection }
    }

    /// Approximate collection size. Always one round trip.
    pub async fn total(&self) -> Result<u64, TableError> {
        Ok(self.store.estimated_document_count(self.collection).await?)
    }

    /// Exact count of matching documents, or `None` when no plan was built and
    /// the total stands in for it.
    pub async fn filtered(&self, plan: Option<&CountPlan>) -> Result<Option<u64>, TableError> {
        let Some(plan) = plan else {
            debug!(collection = self.collection, "exact count skipped");
            return Ok(None);
        };
        let count = match plan {
            CountPlan::Documents { filter } => self
                .store
                .count_documents(self.collection, filter)
                .await
                .map_err(TableError::CountFailed)?,
            CountPlan::Pipeline { pipeline } => {
                let docs = self
                    .store
                    .aggregate(self.collection, pipeline)
                    .await
                    .map_err(TableError::CountFailed)?;
                count_from_stage(docs.first())
            }
        };
        Ok(Some(count))
    }
}

/// Read the `$count` stage output. No document means nothing matched.
pub fn count_from_stage(doc: Option<&Document>) -> u64 {
    match doc.and_then(|d| d.get(COUNT_FIELD)) {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}
