use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Shape of a direct `find` read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub skip: u64,
    /// `None` returns every matching document after `skip`.
    pub limit: Option<u64>,
}

/// The read operations the grid engine needs from a document store.
///
/// Each call is one round trip. Implementations must not retry; errors go
/// straight back to the caller.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, StoreError>;

    /// Exact number of documents matching `filter`.
    async fn count_documents(&self, collection: &str, filter: &Document)
    -> Result<u64, StoreError>;

    /// Cheap, possibly stale size of the whole collection.
    async fn estimated_document_count(&self, collection: &str) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        (**self).find(collection, filter, options).await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, StoreError> {
        (**self).aggregate(collection, pipeline).await
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<u64, StoreError> {
        (**self).count_documents(collection, filter).await
    }

    async fn estimated_document_count(&self, collection: &str) -> Result<u64, StoreError> {
        (**self).estimated_document_count(collection).await
    }
}
