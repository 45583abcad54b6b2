use bson::Bson;
use chrono::{DateTime, SecondsFormat, Utc};

/// Turns one projected row into the strings the grid displays.
pub trait RowRenderer: Send + Sync {
    fn render(&self, cells: &[Bson], search: &str) -> Vec<String>;
}

/// One unescaped string per cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl RowRenderer for PlainRenderer {
    fn render(&self, cells: &[Bson], _search: &str) -> Vec<String> {
        cells.iter().map(cell_to_string).collect()
    }
}

pub fn cell_to_string(cell: &Bson) -> String {
    match cell {
        Bson::Null | Bson::Undefined => String::new(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(n) => n.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::ObjectId(id) => id.to_hex(),
        Bson::DateTime(dt) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
