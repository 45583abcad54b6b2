use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::expression::Expression;

/// Resolve a dot path (`"address.city"`) through nested sub-documents.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    match path.split_once('.') {
        None => doc.get(path),
        Some((first, rest)) => match doc.get(first)? {
            Bson::Document(sub) => lookup(sub, rest),
            _ => None,
        },
    }
}

/// Set a value at a dot path, creating intermediate documents as needed.
pub fn set_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((first, rest)) => {
            if !matches!(doc.get(first), Some(Bson::Document(_))) {
                doc.insert(first, Document::new());
            }
            if let Some(Bson::Document(sub)) = doc.get_mut(first) {
                set_path(sub, rest, value);
            }
        }
    }
}

/// Remove the value at a dot path, if present.
pub fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((first, rest)) => {
            if let Some(Bson::Document(sub)) = doc.get_mut(first) {
                remove_path(sub, rest);
            }
        }
    }
}

/// Evaluate whether a document matches the given expression.
pub fn matches(doc: &Document, expr: &Expression) -> bool {
    match expr {
        Expression::All => true,
        Expression::And(children) => children.iter().all(|c| matches(doc, c)),
        Expression::Or(children) => children.iter().any(|c| matches(doc, c)),
        Expression::Nor(children) => !children.iter().any(|c| matches(doc, c)),
        Expression::Eq(field, val) => match lookup(doc, field) {
            // $eq: null matches both missing fields and explicit null values
            None | Some(Bson::Null) => matches!(val, Bson::Null),
            Some(found) => any_element(found, |v| value_eq(v, val)),
        },
        Expression::Gt(field, val)
        | Expression::Gte(field, val)
        | Expression::Lt(field, val)
        | Expression::Lte(field, val) => {
            let predicate: fn(Ordering) -> bool = match expr {
                Expression::Gt(..) => |o| o == Ordering::Greater,
                Expression::Gte(..) => |o| o != Ordering::Less,
                Expression::Lt(..) => |o| o == Ordering::Less,
                _ => |o| o != Ordering::Greater,
            };
            match lookup(doc, field) {
                Some(found) => any_element(found, |v| {
                    value_cmp(v, val).is_some_and(predicate)
                }),
                None => false,
            }
        }
        Expression::In(field, values) => match lookup(doc, field) {
            None | Some(Bson::Null) => values.iter().any(|v| matches!(v, Bson::Null)),
            Some(found) => any_element(found, |v| values.iter().any(|q| value_eq(v, q))),
        },
        Expression::Regex(field, re) => match lookup(doc, field) {
            Some(found) => any_element(found, |v| match v {
                Bson::String(s) => re.is_match(s),
                _ => false,
            }),
            None => false,
        },
        Expression::Exists(field, expected) => lookup(doc, field).is_some() == *expected,
    }
}

/// Arrays match when the array itself or any element satisfies the predicate.
fn any_element(value: &Bson, predicate: impl Fn(&Bson) -> bool) -> bool {
    match value {
        Bson::Array(items) => predicate(value) || items.iter().any(&predicate),
        other => predicate(other),
    }
}

/// Equality with numeric cross-type coercion.
pub fn value_eq(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => match (a, b) {
            (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
                as_i64(a) == as_i64(b)
            }
            _ => x == y,
        },
        _ => match (a, b) {
            (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis() == y.timestamp_millis(),
            _ => a == b,
        },
    }
}

/// Ordering between two values of comparable types; `None` for incompatible types.
pub fn value_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            Some(as_i64(a)?.cmp(&as_i64(b)?))
        }
        _ if as_f64(a).is_some() && as_f64(b).is_some() => {
            Some(as_f64(a)?.partial_cmp(&as_f64(b)?).unwrap_or(Ordering::Equal))
        }
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            Some(x.timestamp_millis().cmp(&y.timestamp_millis()))
        }
        _ => None,
    }
}

/// Total order for sorting: missing and null first, then numbers, strings,
/// documents, arrays, booleans and dates, like MongoDB's BSON type order.
pub fn sort_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let rank_a = a.map_or(0, type_rank);
    let rank_b = b.map_or(0, type_rank);
    match (a, b) {
        (Some(x), Some(y)) if rank_a == rank_b => value_cmp(x, y).unwrap_or(Ordering::Equal),
        _ => rank_a.cmp(&rank_b),
    }
}

fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::String(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::Boolean(_) => 6,
        Bson::DateTime(_) => 7,
        _ => 5,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}
