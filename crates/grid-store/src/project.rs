use bson::{Bson, Document};

use crate::error::StoreError;
use crate::eval::{lookup, remove_path, set_path};

enum Mode {
    Include,
    Exclude,
}

/// Apply a `{path: 1 | 0 | "$ref"}` projection to one document.
///
/// Inclusion and exclusion cannot be mixed, except that `_id: 0` may appear in
/// an inclusion projection. `_id` is kept unless excluded explicitly.
pub fn project(doc: &Document, projection: &Document) -> Result<Document, StoreError> {
    if projection.is_empty() {
        return Ok(doc.clone());
    }

    let mut mode: Option<Mode> = None;
    let mut keep_id = true;

    for (path, spec) in projection {
        let element_mode = match spec {
            Bson::String(s) if s.starts_with('$') => Mode::Include,
            other => {
                if truthy(other)? {
                    Mode::Include
                } else {
                    Mode::Exclude
                }
            }
        };
        if path == "_id" {
            keep_id = matches!(element_mode, Mode::Include);
            continue;
        }
        match (&mode, element_mode) {
            (None, m) => mode = Some(m),
            (Some(Mode::Include), Mode::Include) | (Some(Mode::Exclude), Mode::Exclude) => {}
            _ => {
                return Err(StoreError::InvalidPipeline(format!(
                    "cannot mix inclusion and exclusion in projection (at {path})"
                )));
            }
        }
    }

    match mode {
        Some(Mode::Include) => {
            let mut out = Document::new();
            if keep_id {
                if let Some(id) = doc.get("_id") {
                    out.insert("_id", id.clone());
                }
            }
            for (path, spec) in projection {
                if path == "_id" {
                    continue;
                }
                let value = match spec {
                    Bson::String(reference) if reference.starts_with('$') => {
                        lookup(doc, &reference[1..])
                    }
                    _ => lookup(doc, path),
                };
                if let Some(value) = value {
                    set_path(&mut out, path, value.clone());
                }
            }
            Ok(out)
        }
        Some(Mode::Exclude) => {
            let mut out = doc.clone();
            for (path, _) in projection {
                remove_path(&mut out, path);
            }
            Ok(out)
        }
        None => {
            let mut out = doc.clone();
            if !keep_id {
                out.remove("_id");
            }
            Ok(out)
        }
    }
}

fn truthy(spec: &Bson) -> Result<bool, StoreError> {
    match spec {
        Bson::Int32(i) => Ok(*i != 0),
        Bson::Int64(i) => Ok(*i != 0),
        Bson::Double(d) => Ok(*d != 0.0),
        Bson::Boolean(b) => Ok(*b),
        other => Err(StoreError::InvalidPipeline(format!(
            "unsupported projection value: {other}"
        ))),
    }
}
