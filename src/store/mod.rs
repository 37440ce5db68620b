pub mod task_store;
pub mod result_index;
pub mod query;

pub use task_store::TaskStore;
pub use result_index::{ResultIndex, SearchIndex};
pub use query::{QueryClause, SearchQuery};
