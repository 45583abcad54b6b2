use std::collections::HashMap;
use std::sync::Arc;

use grid_query::Query;
use grid_store::DocumentStore;
use tokio_util::sync::CancellationToken;

use crate::config::TableConfig;
use crate::decode::decode_request;
use crate::error::TableError;
use crate::executor::PaginationExecutor;
use crate::output::DataTable;
use crate::render::RowRenderer;
use crate::template::TemplateRenderer;

/// One configured table: decodes requests, runs them and renders the rows.
pub struct TableService<S: ?Sized> {
    config: TableConfig,
    executor: PaginationExecutor<S>,
    renderer: Box<dyn RowRenderer>,
}

impl<S: DocumentStore + ?Sized> TableService<S> {
    /// Validates `config` and renders through its templates.
    pub fn new(config: TableConfig, store: Arc<S>) -> Result<Self, TableError> {
        config.validate()?;
        let renderer = TemplateRenderer::from_config(&config)?;
        let executor = PaginationExecutor::new(store).with_timeout(config.timeout());
        Ok(Self {
            config,
            executor,
            renderer: Box::new(renderer),
        })
    }

    pub fn with_renderer(mut self, renderer: impl RowRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub async fn get_table_data(
        &self,
        params: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<DataTable, TableError> {
        let query = decode_request(params, &self.config)?;
        self.fetch(&query, cancel).await
    }

    /// Run an already-built query. Its field names must come from this
    /// table's columns.
    pub async fn fetch(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<DataTable, TableError> {
        let page = self.executor.execute(query, cancel).await?;
        Ok(DataTable::from_page(
            &page,
            &query.fields,
            &query.search,
            self.renderer.as_ref(),
        ))
    }
}
