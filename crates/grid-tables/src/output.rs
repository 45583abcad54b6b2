use serde::{Deserialize, Serialize};

use crate::executor::Page;
use crate::projector::project_row;
use crate::render::RowRenderer;

/// The DataTables server-side response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    /// Always serialized as an array, empty when nothing matched.
    pub data: Vec<Vec<String>>,
    #[serde(rename = "recordsTotal")]
    pub records_total: u64,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: u64,
}

impl DataTable {
    pub fn from_page(
        page: &Page,
        fields: &[String],
        search: &str,
        renderer: &dyn RowRenderer,
    ) -> Self {
        let data = page
            .rows
            .iter()
            .map(|doc| renderer.render(&project_row(doc, fields), search))
            .collect();
        Self {
            data,
            records_total: page.total,
            records_filtered: page.filtered,
        }
    }
}
