mod error;
pub mod eval;
pub mod expression;
mod memory;
pub mod pipeline;
mod project;
mod store;

pub use error::StoreError;
pub use expression::{Expression, parse_filter};
pub use memory::MemoryStore;
pub use pipeline::run_pipeline;
pub use project::project;
pub use store::{DocumentStore, FindOptions};
