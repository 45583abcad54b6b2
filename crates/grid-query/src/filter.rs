use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};

use crate::value::FilterValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// All filters that target one field, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup<'a> {
    pub field: &'a str,
    pub filters: Vec<&'a FilterValue>,
}

/// The AND-level terms contributed by typed filters and the raw clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterTerms {
    pub terms: Vec<Document>,
    /// True when any typed filter or a raw clause was present.
    pub filtered: bool,
}

/// Group filters by field, keeping the order in which each field first appears.
pub fn group_filters(filters: &[Filter]) -> Vec<FieldGroup<'_>> {
    let mut groups: Vec<FieldGroup<'_>> = Vec::new();
    for filter in filters {
        match groups.iter_mut().find(|g| g.field == filter.field) {
            Some(group) => group.filters.push(&filter.value),
            None => groups.push(FieldGroup {
                field: &filter.field,
                filters: vec![&filter.value],
            }),
        }
    }
    groups
}

/// Compile one filter value on `field` into a single clause.
pub fn compile_clause(field: &str, value: &FilterValue) -> Document {
    let condition = match value {
        FilterValue::IntRange { min, max } => {
            Bson::Document(doc! { "$gte": *min, "$lte": *max })
        }
        FilterValue::FloatRange { min, max } => {
            Bson::Document(doc! { "$gte": *min, "$lte": *max })
        }
        FilterValue::StringSet(values) => Bson::Document(doc! { "$in": value_array(values) }),
        scalar => scalar.to_bson(),
    };
    let mut clause = Document::new();
    clause.insert(field, condition);
    clause
}

/// OR the clauses of one group. An empty group matches nothing.
pub fn or_group(clauses: Vec<Document>) -> Document {
    if clauses.is_empty() {
        return match_nothing();
    }
    let clauses: Vec<Bson> = clauses.into_iter().map(Bson::Document).collect();
    doc! { "$or": clauses }
}

/// A clause no document satisfies.
pub fn match_nothing() -> Document {
    doc! { "_id": { "$in": Bson::Array(Vec::new()) } }
}

/// Compile typed filters plus the optional raw clause into AND-level terms.
///
/// Same-field filters are OR-ed inside one group; groups appear in first-seen
/// field order. The raw clause, when present, is always the last term.
pub fn compile_filters(filters: &[Filter], raw: Option<&Document>) -> FilterTerms {
    let mut terms: Vec<Document> = group_filters(filters)
        .into_iter()
        .map(|group| {
            let clauses = group
                .filters
                .iter()
                .map(|value| compile_clause(group.field, value))
                .collect();
            or_group(clauses)
        })
        .collect();

    if let Some(raw) = raw {
        terms.push(raw.clone());
    }

    let filtered = !terms.is_empty();
    FilterTerms { terms, filtered }
}

fn value_array(values: &[String]) -> Vec<Bson> {
    values.iter().cloned().map(Bson::String).collect()
}
