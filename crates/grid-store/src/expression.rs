use bson::{Bson, Document};
use regex::Regex;

use crate::error::StoreError;

/// A filter document parsed into an owned expression tree.
#[derive(Debug, Clone)]
pub enum Expression {
    /// `{}`: matches every document.
    All,
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Nor(Vec<Expression>),
    Eq(String, Bson),
    Gt(String, Bson),
    Gte(String, Bson),
    Lt(String, Bson),
    Lte(String, Bson),
    In(String, Vec<Bson>),
    Regex(String, Regex),
    Exists(String, bool),
}

/// Parse a filter document following MongoDB query semantics:
/// - the top-level document is an implicit AND of its entries,
/// - `{ "field": value }` is implicit `$eq`,
/// - `{ "field": { "$gte": a, "$lte": b } }` ANDs its operators,
/// - `$and` / `$or` / `$nor` take non-empty arrays of sub-filters,
/// - `{ "field": { "$regex": "p", "$options": "i" } }` for regex.
pub fn parse_filter(doc: &Document) -> Result<Expression, StoreError> {
    let mut children = Vec::with_capacity(doc.len());

    for (key, value) in doc {
        match key.as_str() {
            "$and" => children.push(Expression::And(parse_logical_array(key, value)?)),
            "$or" => children.push(Expression::Or(parse_logical_array(key, value)?)),
            "$nor" => children.push(Expression::Nor(parse_logical_array(key, value)?)),
            k if k.starts_with('$') => {
                return Err(invalid(format!("unknown top-level operator: {k}")));
            }
            _ => children.push(parse_field_condition(key, value)?),
        }
    }

    Ok(match children.len() {
        0 => Expression::All,
        1 => children.remove(0),
        _ => Expression::And(children),
    })
}

fn parse_logical_array(op: &str, value: &Bson) -> Result<Vec<Expression>, StoreError> {
    let arr = match value {
        Bson::Array(a) => a,
        _ => return Err(invalid(format!("{op} value must be an array"))),
    };

    if arr.is_empty() {
        return Err(invalid(format!("{op} array must not be empty")));
    }

    arr.iter()
        .map(|elem| match elem {
            Bson::Document(sub) => parse_filter(sub),
            _ => Err(invalid(format!("{op} array elements must be documents"))),
        })
        .collect()
}

fn parse_field_condition(field: &str, value: &Bson) -> Result<Expression, StoreError> {
    if let Bson::Document(sub) = value {
        if sub.keys().next().is_some_and(|k| k.starts_with('$')) {
            return parse_operator_doc(field, sub);
        }
    }
    Ok(Expression::Eq(field.to_string(), value.clone()))
}

fn parse_operator_doc(field: &str, doc: &Document) -> Result<Expression, StoreError> {
    if doc.contains_key("$regex") {
        return parse_regex(field, doc);
    }

    let mut conditions = Vec::with_capacity(doc.len());
    for (op, value) in doc {
        let f = field.to_string();
        let expr = match op.as_str() {
            "$eq" => Expression::Eq(f, value.clone()),
            "$gt" => Expression::Gt(f, value.clone()),
            "$gte" => Expression::Gte(f, value.clone()),
            "$lt" => Expression::Lt(f, value.clone()),
            "$lte" => Expression::Lte(f, value.clone()),
            "$in" => match value {
                Bson::Array(values) => Expression::In(f, values.clone()),
                _ => return Err(invalid("$in value must be an array".into())),
            },
            "$exists" => match value {
                Bson::Boolean(b) => Expression::Exists(f, *b),
                _ => return Err(invalid("$exists value must be a boolean".into())),
            },
            "$options" => return Err(invalid("$options without $regex".into())),
            k => return Err(invalid(format!("unknown field operator: {k}"))),
        };
        conditions.push(expr);
    }

    Ok(match conditions.len() {
        1 => conditions.remove(0),
        _ => Expression::And(conditions),
    })
}

fn parse_regex(field: &str, doc: &Document) -> Result<Expression, StoreError> {
    let mut pattern: Option<&str> = None;
    let mut options: Option<&str> = None;

    for (key, value) in doc {
        match (key.as_str(), value) {
            ("$regex", Bson::String(s)) => pattern = Some(s),
            ("$regex", _) => return Err(invalid("$regex value must be a string".into())),
            ("$options", Bson::String(s)) => options = Some(s),
            ("$options", _) => return Err(invalid("$options value must be a string".into())),
            (k, _) => return Err(invalid(format!("unexpected key alongside $regex: {k}"))),
        }
    }

    let pat = pattern.ok_or_else(|| invalid("missing $regex pattern".into()))?;

    let full_pattern = match options {
        Some(opts) if !opts.is_empty() => {
            let mut prefix = String::with_capacity(3 + opts.len() + pat.len());
            prefix.push_str("(?");
            for ch in opts.chars() {
                match ch {
                    'i' | 's' | 'm' | 'x' => prefix.push(ch),
                    c => return Err(invalid(format!("unknown regex option: {c}"))),
                }
            }
            prefix.push(')');
            prefix.push_str(pat);
            prefix
        }
        _ => pat.to_string(),
    };

    let re = Regex::new(&full_pattern).map_err(|e| invalid(format!("invalid regex pattern: {e}")))?;
    Ok(Expression::Regex(field.to_string(), re))
}

fn invalid(msg: String) -> StoreError {
    StoreError::InvalidFilter(msg)
}
