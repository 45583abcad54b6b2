use std::fmt::Write;

use bson::{Bson, doc};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-column value transform applied before templating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueFormat {
    /// Dates and integer unix seconds become `{unix, formatted}`.
    Date { format: String },
    /// Integer seconds become `{seconds, formatted}`.
    Duration,
}

impl ValueFormat {
    /// Check a `Date` format string without rendering anything.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ValueFormat::Date { format } => {
                if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                    Err(format!("invalid date format: {format}"))
                } else {
                    Ok(())
                }
            }
            ValueFormat::Duration => Ok(()),
        }
    }

    /// Values of an unexpected type pass through unchanged.
    pub fn apply(&self, value: &Bson) -> Bson {
        match self {
            ValueFormat::Date { format } => format_date(value, format),
            ValueFormat::Duration => match as_int(value) {
                Some(seconds) => Bson::Document(doc! {
                    "seconds": seconds,
                    "formatted": format_duration(seconds),
                }),
                None => value.clone(),
            },
        }
    }
}

fn format_date(value: &Bson, format: &str) -> Bson {
    let millis = match value {
        Bson::DateTime(dt) => dt.timestamp_millis(),
        other => match as_int(other) {
            Some(seconds) => seconds.saturating_mul(1000),
            None => return value.clone(),
        },
    };

    if millis == 0 {
        return Bson::Document(doc! { "unix": 0_i64, "formatted": "N/A" });
    }
    let Some(time) = DateTime::<Utc>::from_timestamp_millis(millis) else {
        return value.clone();
    };

    let mut formatted = String::new();
    if write!(formatted, "{}", time.format(format)).is_err() {
        return value.clone();
    }
    Bson::Document(doc! { "unix": time.timestamp(), "formatted": formatted })
}

fn as_int(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        _ => None,
    }
}

/// `3h 4m 5s`.
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}h {minutes}m {secs}s")
}
