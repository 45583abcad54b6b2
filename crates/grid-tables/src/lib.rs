mod config;
mod count;
mod decode;
mod error;
mod executor;
mod format;
mod highlight;
pub mod http;
mod output;
mod plan;
mod projector;
mod render;
mod service;
mod template;

pub use config::{ColumnConfig, TableConfig};
pub use count::{CountEngine, count_from_stage};
pub use decode::{decode_request, parse_params};
pub use error::TableError;
pub use executor::{Page, PaginationExecutor};
pub use format::{ValueFormat, format_duration};
pub use highlight::{HIGHLIGHT_CLASS, Highlighter};
pub use http::TableHttp;
pub use output::DataTable;
pub use plan::{COUNT_FIELD, CountPlan, ExecutionPlan, Strategy, explain};
pub use projector::{EMPTY_CELL, project_row, project_rows};
pub use render::{PlainRenderer, RowRenderer, cell_to_string};
pub use service::TableService;
pub use template::{Template, TemplateRenderer, context_key};
