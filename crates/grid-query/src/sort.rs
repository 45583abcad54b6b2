use bson::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Ordered sort document. The first pair is the primary key, the rest break ties
/// in the order given. A repeated field keeps its first direction. `None`
/// leaves the store's default order.
pub fn compile_sort(sorts: &[Sort]) -> Option<Document> {
    if sorts.is_empty() {
        return None;
    }
    let mut spec = Document::new();
    for sort in sorts {
        if !spec.contains_key(&sort.field) {
            spec.insert(sort.field.as_str(), sort.direction.as_i32());
        }
    }
    Some(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn preserves_given_order() {
        let spec = compile_sort(&[Sort::desc("status"), Sort::asc("name"), Sort::desc("age")])
            .unwrap();
        assert_eq!(spec, doc! { "status": -1, "name": 1, "age": -1 });
        let keys: Vec<&String> = spec.keys().collect();
        assert_eq!(keys, vec!["status", "name", "age"]);
    }

    #[test]
    fn repeated_field_keeps_first_direction() {
        let spec = compile_sort(&[Sort::asc("name"), Sort::desc("age"), Sort::desc("name")])
            .unwrap();
        assert_eq!(spec, doc! { "name": 1, "age": -1 });
        let keys: Vec<&String> = spec.keys().collect();
        assert_eq!(keys, vec!["name", "age"]);
    }

    #[test]
    fn empty_is_default_order() {
        assert!(compile_sort(&[]).is_none());
    }
}
