use std::path::{Path, PathBuf};
use std::sync::Arc;

use bson::{Bson, Document};
use grid_store::{MemoryStore, StoreError};
use grid_tables::{TableConfig, TableError, TableHttp, TableService};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid seed file {path}: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: SeedError,
    },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("entry {index}: {source}")]
    ExtendedJson {
        index: usize,
        #[source]
        source: bson::error::Error,
    },
    #[error("entry {index} is not a document")]
    NotADocument { index: usize },
}

pub fn load_config(path: &Path) -> Result<TableConfig, StartupError> {
    let json = read(path)?;
    Ok(TableConfig::from_json(&json)?)
}

/// Load a JSON array of documents into the table's collection.
pub fn seed_store(
    store: &MemoryStore,
    collection: &str,
    path: &Path,
) -> Result<usize, StartupError> {
    let json = read(path)?;
    let docs = parse_seed(&json).map_err(|source| StartupError::Seed {
        path: path.to_path_buf(),
        source,
    })?;
    let inserted = store.insert_many(collection, docs)?;
    info!(collection, inserted, "seeded store");
    Ok(inserted)
}

/// Parse a JSON array of extended-JSON documents, so `{"$date": ...}` and
/// `{"$oid": ...}` land as their BSON types.
pub fn parse_seed(json: &str) -> Result<Vec<Document>, SeedError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match Bson::try_from(entry) {
            Ok(Bson::Document(doc)) => Ok(doc),
            Ok(_) => Err(SeedError::NotADocument { index }),
            Err(source) => Err(SeedError::ExtendedJson { index, source }),
        })
        .collect()
}

pub fn build_state(
    config: TableConfig,
    store: MemoryStore,
    shutdown: CancellationToken,
) -> Result<AppState, StartupError> {
    let service = TableService::new(config, Arc::new(store))?;
    Ok(AppState {
        table: Arc::new(TableHttp::new(service)),
        shutdown,
    })
}

fn read(path: &Path) -> Result<String, StartupError> {
    std::fs::read_to_string(path).map_err(|source| StartupError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;
    use bson::oid::ObjectId;

    #[test]
    fn seed_reads_extended_json_types() {
        let docs = parse_seed(
            r#"[
                {
                    "_id": { "$oid": "65543b2c9f1e4a0b8c7d6e5f" },
                    "title": "Login broken",
                    "created": { "$date": "2023-11-14T22:13:20Z" },
                    "votes": 3
                }
            ]"#,
        )
        .unwrap();
        let id = ObjectId::parse_str("65543b2c9f1e4a0b8c7d6e5f").unwrap();
        assert_eq!(docs[0].get_object_id("_id").unwrap(), id);
        assert_eq!(
            docs[0].get_datetime("created").unwrap(),
            &DateTime::from_millis(1_700_000_000_000)
        );
        assert_eq!(docs[0].get_str("title").unwrap(), "Login broken");
        assert_eq!(docs[0].get("votes"), Some(&Bson::Int32(3)));
    }

    #[test]
    fn seed_entries_must_be_documents() {
        let err = parse_seed(r#"[{ "title": "ok" }, 7]"#).unwrap_err();
        assert!(matches!(err, SeedError::NotADocument { index: 1 }));
    }

    #[test]
    fn seed_must_be_an_array() {
        let err = parse_seed(r#"{ "title": "ok" }"#).unwrap_err();
        assert!(matches!(err, SeedError::Json(_)));
    }

    #[test]
    fn seed_store_inserts_parsed_documents() {
        let path = std::env::temp_dir().join(format!("grid-seed-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{ "title": "a" }, { "title": "b" }]"#).unwrap();
        let store = MemoryStore::new();
        let inserted = seed_store(&store, "tickets", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.collection_names(), vec!["tickets".to_string()]);
    }
}
