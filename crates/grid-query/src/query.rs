use bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::filter::Filter;
use crate::sort::Sort;

/// One grid-data request, built by the inbound adapter and read by every
/// compiler stage.
///
/// Field names in `filters`, `sort` and `search_fields` become literal keys in
/// the compiled filter. They must already be checked against the table's
/// allow-list; nothing downstream checks them again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub table: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub raw_filter: Option<Document>,
    #[serde(default)]
    pub sort: Vec<Sort>,
    /// 0 means unbounded.
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Aggregation stages to run ahead of the generated match/sort/skip/limit.
    #[serde(default)]
    pub pipeline: Vec<Document>,
}

impl Query {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn uses_pipeline(&self) -> bool {
        !self.pipeline.is_empty()
    }

    /// Structural checks that must pass before any store round trip.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.table.is_empty() {
            return Err(QueryError::MissingTable);
        }
        if let Some(field) = self.fields.iter().find(|f| !is_valid_path(f)) {
            return Err(QueryError::InvalidField(field.clone()));
        }
        if let Some(sort) = self.sort.iter().find(|s| !is_valid_path(&s.field)) {
            return Err(QueryError::InvalidSort(sort.field.clone()));
        }
        if let Some(filter) = self.filters.iter().find(|f| !is_valid_path(&f.field)) {
            return Err(QueryError::InvalidField(filter.field.clone()));
        }
        if self.offset > i64::MAX as u64 || self.limit > i64::MAX as u64 {
            return Err(QueryError::InvalidWindow {
                offset: self.offset,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

/// A dot path with no empty segment.
fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(|segment| !segment.is_empty())
}
