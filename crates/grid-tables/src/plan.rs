use bson::{Bson, Document, doc};
use grid_query::{MatchPlan, Query, compile_match, compile_sort, plan_projection};
use grid_store::FindOptions;
use serde::{Deserialize, Serialize};

/// Name of the field the count pipeline writes its result to.
pub const COUNT_FIELD: &str = "count";

/// How the page of rows is read. Exactly one strategy runs per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    Find {
        filter: Document,
        options: FindOptions,
    },
    Aggregate {
        pipeline: Vec<Document>,
    },
}

/// How the exact filtered count is obtained, when one is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountPlan {
    Documents { filter: Document },
    Pipeline { pipeline: Vec<Document> },
}

/// Every store call one request will make, built without touching the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub collection: String,
    pub strategy: Strategy,
    /// `None` means the filtered count equals the collection total.
    pub count: Option<CountPlan>,
}

/// Compile a query into its execution plan. Equal queries give equal plans.
pub fn explain(query: &Query) -> ExecutionPlan {
    let matched = compile_match(query);
    if query.uses_pipeline() {
        aggregate_plan(query, matched)
    } else {
        find_plan(query, matched)
    }
}

fn find_plan(query: &Query, matched: MatchPlan) -> ExecutionPlan {
    let count = matched
        .needs_exact_count()
        .then(|| CountPlan::Documents {
            filter: matched.filter.clone(),
        });

    let options = FindOptions {
        sort: compile_sort(&query.sort),
        projection: Some(plan_projection(&query.fields)),
        skip: query.offset,
        limit: (query.limit > 0).then_some(query.limit),
    };

    ExecutionPlan {
        collection: query.table.clone(),
        strategy: Strategy::Find {
            filter: matched.filter,
            options,
        },
        count,
    }
}

fn aggregate_plan(query: &Query, matched: MatchPlan) -> ExecutionPlan {
    let mut prefix = query.pipeline.clone();
    prefix.push(doc! { "$match": matched.filter.clone() });

    let count = matched.needs_exact_count().then(|| {
        let mut pipeline = prefix.clone();
        pipeline.push(doc! { "$count": COUNT_FIELD });
        CountPlan::Pipeline { pipeline }
    });

    let mut pipeline = prefix;
    if let Some(sort) = compile_sort(&query.sort) {
        pipeline.push(doc! { "$sort": sort });
    }
    pipeline.push(doc! { "$skip": window(query.offset) });
    // A literal `$limit: 0` would return no rows; unbounded means no stage.
    if query.limit > 0 {
        pipeline.push(doc! { "$limit": window(query.limit) });
    }
    pipeline.push(doc! { "$project": plan_projection(&query.fields) });

    ExecutionPlan {
        collection: query.table.clone(),
        strategy: Strategy::Aggregate { pipeline },
        count,
    }
}

/// `Query::validate` keeps the window within `i64`.
fn window(n: u64) -> Bson {
    Bson::Int64(i64::try_from(n).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_query::{Filter, FilterValue, Sort};

    fn users() -> Query {
        let mut query = Query::new("users");
        query.fields = vec!["name".into(), "address.city".into()];
        query
    }

    #[test]
    fn direct_find_without_filters_skips_exact_count() {
        let mut query = users();
        query.limit = 10;
        query.offset = 20;
        query.sort = vec![Sort::desc("name")];

        let plan = explain(&query);
        assert!(plan.count.is_none());
        assert_eq!(
            plan.strategy,
            Strategy::Find {
                filter: doc! {},
                options: FindOptions {
                    sort: Some(doc! { "name": -1 }),
                    projection: Some(doc! { "name": 1, "address.city": 1, "_id": 0 }),
                    skip: 20,
                    limit: Some(10),
                },
            }
        );
    }

    #[test]
    fn direct_find_zero_limit_is_unbounded() {
        let plan = explain(&users());
        match plan.strategy {
            Strategy::Find { options, .. } => assert_eq!(options.limit, None),
            other => panic!("expected find, got {other:?}"),
        }
    }

    #[test]
    fn filtered_find_counts_with_same_filter() {
        let mut query = users();
        query.filters = vec![Filter::new("status", "open")];
        let plan = explain(&query);
        let Strategy::Find { filter, .. } = &plan.strategy else {
            panic!("expected find");
        };
        assert_eq!(
            plan.count,
            Some(CountPlan::Documents {
                filter: filter.clone()
            })
        );
    }

    #[test]
    fn pipeline_appends_match_sort_skip_limit() {
        let mut query = users();
        query.pipeline = vec![doc! { "$addFields": { "city": "$address.city" } }];
        query.filters = vec![Filter::new("age", FilterValue::IntRange { min: 18, max: 30 })];
        query.sort = vec![Sort::asc("city"), Sort::desc("name")];
        query.offset = 5;
        query.limit = 25;

        let plan = explain(&query);
        let matched = doc! { "$and": [{ "$or": [{ "age": { "$gte": 18_i64, "$lte": 30_i64 } }] }] };
        assert_eq!(
            plan.strategy,
            Strategy::Aggregate {
                pipeline: vec![
                    doc! { "$addFields": { "city": "$address.city" } },
                    doc! { "$match": matched.clone() },
                    doc! { "$sort": { "city": 1, "name": -1 } },
                    doc! { "$skip": 5_i64 },
                    doc! { "$limit": 25_i64 },
                    doc! { "$project": { "name": 1, "address.city": 1, "_id": 0 } },
                ],
            }
        );
        assert_eq!(
            plan.count,
            Some(CountPlan::Pipeline {
                pipeline: vec![
                    doc! { "$addFields": { "city": "$address.city" } },
                    doc! { "$match": matched },
                    doc! { "$count": "count" },
                ],
            })
        );
    }

    #[test]
    fn pipeline_zero_limit_omits_limit_stage() {
        let mut query = users();
        query.pipeline = vec![doc! { "$match": { "active": true } }];
        let plan = explain(&query);
        let Strategy::Aggregate { pipeline } = plan.strategy else {
            panic!("expected aggregate");
        };
        assert!(pipeline.iter().all(|stage| !stage.contains_key("$limit")));
        assert!(pipeline.iter().all(|stage| !stage.contains_key("$sort")));
        assert_eq!(
            &pipeline[pipeline.len() - 2..],
            &[
                doc! { "$skip": 0_i64 },
                doc! { "$project": { "name": 1, "address.city": 1, "_id": 0 } },
            ]
        );
    }

    #[test]
    fn count_pipeline_is_not_projected() {
        let mut query = users();
        query.pipeline = vec![doc! { "$match": { "active": true } }];
        query.filters = vec![Filter::new("status", "open")];
        let Some(CountPlan::Pipeline { pipeline }) = explain(&query).count else {
            panic!("expected count pipeline");
        };
        assert!(pipeline.iter().all(|stage| !stage.contains_key("$project")));
        assert_eq!(pipeline.last(), Some(&doc! { "$count": "count" }));
    }

    #[test]
    fn explain_is_byte_identical_for_equal_queries() {
        let mut query = users();
        query.search = "jo".into();
        query.search_fields = vec!["name".into()];
        query.filters = vec![Filter::new("tag", "a"), Filter::new("tag", "b")];
        query.pipeline = vec![doc! { "$match": { "deleted": false } }];
        query.sort = vec![Sort::asc("name"), Sort::desc("age")];

        let a = serde_json::to_string(&explain(&query)).unwrap();
        let b = serde_json::to_string(&explain(&query.clone())).unwrap();
        assert_eq!(a, b);
    }
}
