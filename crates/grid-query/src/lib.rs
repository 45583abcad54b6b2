mod compile;
mod error;
pub mod filter;
pub mod projection;
mod query;
mod search;
mod sort;
mod value;

pub use compile::{MatchPlan, compile_match};
pub use error::QueryError;
pub use filter::{Filter, FilterTerms, compile_filters};
pub use projection::{ID_FIELD, plan_projection};
pub use query::Query;
pub use search::compile_search;
pub use sort::{Sort, SortDirection, compile_sort};
pub use value::FilterValue;
