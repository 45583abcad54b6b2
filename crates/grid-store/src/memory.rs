use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use imbl::{OrdMap, Vector};
use tracing::trace;

use crate::error::StoreError;
use crate::eval::matches;
use crate::expression::parse_filter;
use crate::pipeline::{run_pipeline, sort_documents, sort_keys};
use crate::project::project;
use crate::store::{DocumentStore, FindOptions};

type Collections = OrdMap<String, Vector<Document>>;

/// In-memory document store. Readers work on an immutable snapshot; writers
/// swap in a new one. Snapshots are cheap due to imbl structural sharing.
pub struct MemoryStore {
    collections: ArcSwap<Collections>,
    write_lock: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: ArcSwap::new(Arc::new(OrdMap::new())),
            write_lock: Mutex::new(()),
        }
    }

    /// Append documents to a collection, creating it if needed. Documents
    /// without an `_id` get a fresh ObjectId.
    pub fn insert_many(
        &self,
        collection: &str,
        docs: impl IntoIterator<Item = Document>,
    ) -> Result<usize, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("write lock poisoned: {e}")))?;

        let mut next = (**self.collections.load()).clone();
        let entry = next.entry(collection.to_string()).or_insert_with(Vector::new);
        let mut inserted = 0;
        for mut doc in docs {
            if !doc.contains_key("_id") {
                doc.insert("_id", Bson::ObjectId(ObjectId::new()));
            }
            entry.push_back(doc);
            inserted += 1;
        }
        self.collections.store(Arc::new(next));

        trace!(collection, inserted, "insert_many");
        Ok(inserted)
    }

    pub fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.insert_many(collection, std::iter::once(doc)).map(|_| ())
    }

    /// Remove a collection. Returns whether it existed.
    pub fn drop_collection(&self, collection: &str) -> Result<bool, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("write lock poisoned: {e}")))?;

        let mut next = (**self.collections.load()).clone();
        let existed = next.remove(collection).is_some();
        self.collections.store(Arc::new(next));
        Ok(existed)
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.load().keys().cloned().collect()
    }

    /// A missing collection reads as empty, as in MongoDB.
    fn snapshot(&self, collection: &str) -> Vector<Document> {
        self.collections
            .load()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn matching(&self, collection: &str, filter: &Document) -> Result<Vec<Document>, StoreError> {
        let expr = parse_filter(filter)?;
        Ok(self
            .snapshot(collection)
            .into_iter()
            .filter(|doc| matches(doc, &expr))
            .collect())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut docs = self.matching(collection, filter)?;

        if let Some(sort) = &options.sort {
            let keys = sort_keys(sort)?;
            sort_documents(&mut docs, &keys);
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = match options.limit {
            Some(0) | None => usize::MAX,
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        };

        let page = docs.into_iter().skip(skip).take(limit);
        let out: Vec<Document> = match &options.projection {
            Some(projection) => page
                .map(|doc| project(&doc, projection))
                .collect::<Result<_, _>>()?,
            None => page.collect(),
        };

        trace!(collection, returned = out.len(), "find");
        Ok(out)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, StoreError> {
        let docs: Vec<Document> = self.snapshot(collection).into_iter().collect();
        let out = run_pipeline(docs, pipeline)?;
        trace!(collection, stages = pipeline.len(), returned = out.len(), "aggregate");
        Ok(out)
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<u64, StoreError> {
        Ok(self.matching(collection, filter)?.len() as u64)
    }

    async fn estimated_document_count(&self, collection: &str) -> Result<u64, StoreError> {
        Ok(self.snapshot(collection).len() as u64)
    }
}
