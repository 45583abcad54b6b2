use bson::Bson;
use serde::{Deserialize, Serialize};

/// A typed filter payload. The variant decides the shape of the compiled clause:
/// scalars and `Null` compile to equality, ranges to one bounded clause,
/// `StringSet` to membership.
///
/// Range bounds are not checked. `min > max` compiles fine and matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    StringSet(Vec<String>),
    Null,
}

impl FilterValue {
    /// The variant's BSON form. Ranges become a two-element `[min, max]` array.
    pub fn to_bson(&self) -> Bson {
        match self {
            FilterValue::String(s) => Bson::String(s.clone()),
            FilterValue::Int(i) => Bson::Int64(*i),
            FilterValue::Float(f) => Bson::Double(*f),
            FilterValue::Bool(b) => Bson::Boolean(*b),
            FilterValue::IntRange { min, max } => {
                Bson::Array(vec![Bson::Int64(*min), Bson::Int64(*max)])
            }
            FilterValue::FloatRange { min, max } => {
                Bson::Array(vec![Bson::Double(*min), Bson::Double(*max)])
            }
            FilterValue::StringSet(values) => {
                Bson::Array(values.iter().cloned().map(Bson::String).collect())
            }
            FilterValue::Null => Bson::Null,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterValue::IntRange { .. } | FilterValue::FloatRange { .. }
        )
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Int(i)
    }
}

impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        FilterValue::Float(f)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}
