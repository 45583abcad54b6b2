use bson::{Bson, Document};

/// Cell value for a path that does not resolve.
pub const EMPTY_CELL: Bson = Bson::Null;

/// One cell per requested path, in request order. A missing segment or a
/// non-document intermediate yields [`EMPTY_CELL`].
pub fn project_row(doc: &Document, fields: &[String]) -> Vec<Bson> {
    fields
        .iter()
        .map(|path| resolve(doc, path).cloned().unwrap_or(EMPTY_CELL))
        .collect()
}

pub fn project_rows(docs: &[Document], fields: &[String]) -> Vec<Vec<Bson>> {
    docs.iter().map(|doc| project_row(doc, fields)).collect()
}

fn resolve<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}
