pub mod commands;
pub mod serve;
pub mod check;
pub mod status;

pub use commands::{Cli, Commands};
