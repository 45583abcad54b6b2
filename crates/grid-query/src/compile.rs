use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};

use crate::filter::compile_filters;
use crate::query::Query;
use crate::search::compile_search;

/// The compiled filter tree for one query and the flags the count stage needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlan {
    /// `{"$and": [...]}`, or `{}` when there is nothing to filter on.
    pub filter: Document,
    pub filtered: bool,
    pub searched: bool,
}

impl MatchPlan {
    /// Whether the filtered count can differ from the collection total.
    pub fn needs_exact_count(&self) -> bool {
        self.filtered || self.searched
    }
}

/// Build the AND-of-ORs filter: the search term first, then one OR group per
/// filtered field, then the raw clause.
pub fn compile_match(query: &Query) -> MatchPlan {
    let search = compile_search(&query.search, &query.search_fields);
    let filters = compile_filters(&query.filters, query.raw_filter.as_ref());

    let searched = search.is_some();
    let filtered = filters.filtered;

    let terms: Vec<Bson> = search
        .into_iter()
        .chain(filters.terms)
        .map(Bson::Document)
        .collect();

    let filter = if terms.is_empty() {
        Document::new()
    } else {
        doc! { "$and": terms }
    };

    MatchPlan {
        filter,
        filtered,
        searched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::value::FilterValue;

    #[test]
    fn no_terms_is_empty_filter() {
        let plan = compile_match(&Query::new("users"));
        assert_eq!(plan.filter, Document::new());
        assert!(!plan.needs_exact_count());
    }

    #[test]
    fn single_equality_shape() {
        let mut query = Query::new("tickets");
        query.filters = vec![Filter::new("status", "open")];
        let plan = compile_match(&query);
        assert_eq!(plan.filter, doc! { "$and": [{ "$or": [{ "status": "open" }] }] });
        assert!(plan.filtered);
        assert!(!plan.searched);
    }

    #[test]
    fn search_joins_at_the_and_level() {
        let mut query = Query::new("users");
        query.search = "joh".into();
        query.search_fields = vec!["name".into(), "email".into()];
        query.filters = vec![Filter::new(
            "age",
            FilterValue::IntRange { min: 18, max: 30 },
        )];
        let plan = compile_match(&query);
        assert_eq!(
            plan.filter,
            doc! { "$and": [
                { "$or": [
                    { "name": { "$regex": "joh", "$options": "i" } },
                    { "email": { "$regex": "joh", "$options": "i" } },
                ] },
                { "$or": [{ "age": { "$gte": 18_i64, "$lte": 30_i64 } }] },
            ] }
        );
        assert!(plan.searched);
        assert!(plan.filtered);
    }

    #[test]
    fn search_without_fields_is_ignored() {
        let mut query = Query::new("users");
        query.search = "joh".into();
        let plan = compile_match(&query);
        assert!(!plan.searched);
        assert_eq!(plan.filter, Document::new());
    }

    #[test]
    fn filter_input_order_only_moves_groups() {
        let mut a = Query::new("t");
        a.filters = vec![
            Filter::new("x", 1_i64),
            Filter::new("y", 2_i64),
            Filter::new("x", 3_i64),
        ];
        let mut b = Query::new("t");
        b.filters = vec![
            Filter::new("y", 2_i64),
            Filter::new("x", 1_i64),
            Filter::new("x", 3_i64),
        ];

        let terms = |plan: MatchPlan| -> Vec<Bson> {
            let mut terms = plan.filter.get_array("$and").unwrap().clone();
            terms.sort_by_key(|t| t.to_string());
            terms
        };
        assert_eq!(terms(compile_match(&a)), terms(compile_match(&b)));
    }

    #[test]
    fn compilation_is_deterministic() {
        let mut query = Query::new("users");
        query.search = "a+b".into();
        query.search_fields = vec!["name".into()];
        query.filters = vec![Filter::new("tag", "a"), Filter::new("tag", "b")];
        query.raw_filter = Some(doc! { "deleted": false });

        let first = serde_json::to_vec(&compile_match(&query)).unwrap();
        let second = serde_json::to_vec(&compile_match(&query.clone())).unwrap();
        assert_eq!(first, second);
    }
}
