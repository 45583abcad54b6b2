use bson::{Bson, Document};

use crate::error::StoreError;
use crate::eval::{lookup, matches, set_path, sort_cmp};
use crate::expression::parse_filter;
use crate::project::project;

/// Run an aggregation pipeline over a snapshot of documents.
///
/// Supported stages: `$match`, `$sort`, `$skip`, `$limit`, `$count`,
/// `$project`, `$addFields` / `$set`.
pub fn run_pipeline(
    mut docs: Vec<Document>,
    pipeline: &[Document],
) -> Result<Vec<Document>, StoreError> {
    for stage in pipeline {
        let (name, spec) = single_entry(stage)?;
        docs = match name {
            "$match" => {
                let expr = parse_filter(as_document(name, spec)?)?;
                docs.retain(|d| matches(d, &expr));
                docs
            }
            "$sort" => {
                let keys = sort_keys(as_document(name, spec)?)?;
                sort_documents(&mut docs, &keys);
                docs
            }
            "$skip" => {
                let n = as_count(name, spec)?;
                docs.into_iter().skip(n).collect()
            }
            "$limit" => {
                let n = as_count(name, spec)?;
                if n == 0 {
                    return Err(invalid("$limit must be positive".into()));
                }
                docs.truncate(n);
                docs
            }
            "$count" => {
                let field = match spec {
                    Bson::String(s) if !s.is_empty() && !s.starts_with('$') => s,
                    _ => return Err(invalid("$count requires a non-empty field name".into())),
                };
                // No input documents means no output document, as in MongoDB.
                if docs.is_empty() {
                    Vec::new()
                } else {
                    let mut out = Document::new();
                    out.insert(field.as_str(), docs.len() as i64);
                    vec![out]
                }
            }
            "$project" => {
                let projection = as_document(name, spec)?;
                docs.iter()
                    .map(|d| project(d, projection))
                    .collect::<Result<_, _>>()?
            }
            "$addFields" | "$set" => {
                let fields = as_document(name, spec)?;
                for doc in &mut docs {
                    add_fields(doc, fields);
                }
                docs
            }
            other => return Err(invalid(format!("unsupported stage: {other}"))),
        };
    }
    Ok(docs)
}

/// Parse a `{field: 1 | -1}` sort document, keeping its key order.
pub fn sort_keys(spec: &Document) -> Result<Vec<(String, bool)>, StoreError> {
    if spec.is_empty() {
        return Err(invalid("$sort must have at least one key".into()));
    }
    spec.iter()
        .map(|(field, direction)| {
            let descending = match direction {
                Bson::Int32(1) | Bson::Int64(1) => false,
                Bson::Int32(-1) | Bson::Int64(-1) => true,
                Bson::Double(d) if *d == 1.0 => false,
                Bson::Double(d) if *d == -1.0 => true,
                other => {
                    return Err(invalid(format!(
                        "sort direction for {field} must be 1 or -1, got {other}"
                    )));
                }
            };
            Ok((field.clone(), descending))
        })
        .collect()
}

/// Stable multi-key sort; earlier keys take precedence.
pub fn sort_documents(docs: &mut [Document], keys: &[(String, bool)]) {
    docs.sort_by(|a, b| {
        for (field, descending) in keys {
            let ord = sort_cmp(lookup(a, field), lookup(b, field));
            let ord = if *descending { ord.reverse() } else { ord };
            if ord.is_ne() {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
}

fn add_fields(doc: &mut Document, fields: &Document) {
    for (path, value) in fields {
        let resolved = match value {
            // A reference to a missing path adds nothing.
            Bson::String(reference) if reference.starts_with('$') => {
                match lookup(doc, &reference[1..]) {
                    Some(found) => found.clone(),
                    None => continue,
                }
            }
            literal => literal.clone(),
        };
        set_path(doc, path, resolved);
    }
}

fn single_entry(stage: &Document) -> Result<(&str, &Bson), StoreError> {
    let mut iter = stage.iter();
    match (iter.next(), iter.next()) {
        (Some((name, spec)), None) => Ok((name.as_str(), spec)),
        _ => Err(invalid("each stage must have exactly one key".into())),
    }
}

fn as_document<'a>(stage: &str, spec: &'a Bson) -> Result<&'a Document, StoreError> {
    match spec {
        Bson::Document(d) => Ok(d),
        _ => Err(invalid(format!("{stage} requires a document"))),
    }
}

fn as_count(stage: &str, spec: &Bson) -> Result<usize, StoreError> {
    let n = match spec {
        Bson::Int32(i) => i64::from(*i),
        Bson::Int64(i) => *i,
        Bson::Double(d) if d.fract() == 0.0 => *d as i64,
        _ => return Err(invalid(format!("{stage} requires an integer"))),
    };
    usize::try_from(n).map_err(|_| invalid(format!("{stage} must not be negative")))
}

fn invalid(msg: String) -> StoreError {
    StoreError::InvalidPipeline(msg)
}
