use bson::Document;

pub const ID_FIELD: &str = "_id";

/// Selection of exactly the requested paths, with `_id` always excluded.
pub fn plan_projection(fields: &[String]) -> Document {
    let mut projection = Document::new();
    for field in fields.iter().filter(|f| f.as_str() != ID_FIELD) {
        projection.insert(field.as_str(), 1);
    }
    projection.insert(ID_FIELD, 0);
    projection
}
