use std::time::Duration;

use bson::Document;
use grid_query::Filter;
use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::format::ValueFormat;
use crate::template::TemplateRenderer;

/// Server-side definition of one grid table. Column names are the only field
/// names a client can reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub collection: String,
    /// Largest page a client may ask for. 0 means no bound.
    #[serde(default)]
    pub max_rows: u64,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Cell templates. Empty renders one cell per column.
    #[serde(default)]
    pub row: Vec<String>,
    #[serde(default)]
    pub highlight_search: bool,
    /// Applied to every request.
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub raw_filter: Option<Document>,
    #[serde(default)]
    pub pipeline: Vec<Document>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: None,
        }
    }
}

impl TableConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let config: TableConfig =
            serde_json::from_str(json).map_err(|e| TableError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TableError> {
        if self.collection.is_empty() {
            return Err(config_error("collection must not be empty"));
        }
        if self.columns.is_empty() {
            return Err(config_error("at least one column is required"));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if column.name.is_empty() || column.name.split('.').any(str::is_empty) {
                return Err(config_error(format!("invalid column name: {:?}", column.name)));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(config_error(format!("duplicate column: {}", column.name)));
            }
            if let Some(format) = &column.format {
                format.validate().map_err(TableError::Config)?;
            }
        }
        if let Some(field) = self.search_fields.iter().find(|f| !self.has_column(f)) {
            return Err(config_error(format!("search field is not a column: {field}")));
        }
        if let Some(filter) = self.filters.iter().find(|f| !self.has_column(&f.field)) {
            return Err(config_error(format!(
                "filter field is not a column: {}",
                filter.field
            )));
        }
        TemplateRenderer::from_config(self).map(|_| ())
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c.name == field)
    }

    /// Column paths in display order.
    pub fn fields(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn config_error(msg: impl Into<String>) -> TableError {
    TableError::Config(msg.into())
}
