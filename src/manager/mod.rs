mod cache;
pub mod scope;
pub mod sweeper;

pub use scope::{ScopeManager, ScopeStatus};
