pub mod rules;
pub mod validator;

pub use rules::{ScopeRule, ScopeTarget};
pub use validator::TargetValidator;
