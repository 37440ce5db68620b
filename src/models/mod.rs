pub mod task;
pub mod host;

pub use task::*;
pub use host::*;
