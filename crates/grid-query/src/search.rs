use bson::{Bson, Document, doc};

/// Compile a free-text term into a case-insensitive "contains" match over `fields`.
///
/// The term is escaped so it matches literally. Field names are used as given;
/// they must come from the search allow-list. Returns `None` when there is
/// nothing to search.
pub fn compile_search(term: &str, fields: &[String]) -> Option<Document> {
    if term.is_empty() || fields.is_empty() {
        return None;
    }

    let pattern = regex::escape(term);
    let clauses: Vec<Bson> = fields
        .iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(
                field.as_str(),
                doc! { "$regex": pattern.as_str(), "$options": "i" },
            );
            Bson::Document(clause)
        })
        .collect();

    Some(doc! { "$or": clauses })
}
