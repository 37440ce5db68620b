use tracing::debug;

use crate::config::ScanscopeConfig;
use crate::errors::ScopeError;
use super::rules::{ScopeRule, ScopeTarget};

/// Decides whether a candidate target may be scanned. A target must match at
/// least one allow rule and no deny rule.
#[derive(Debug, Clone, Default)]
pub struct TargetValidator {
    allow: Vec<ScopeRule>,
    deny: Vec<ScopeRule>,
}

impl TargetValidator {
    pub fn new(allow: Vec<ScopeRule>, deny: Vec<ScopeRule>) -> Self {
        Self { allow, deny }
    }

    pub fn from_config(config: &ScanscopeConfig) -> Result<Self, ScopeError> {
        let allow = config.allow_rules().iter()
            .map(|e| ScopeRule::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        let deny = config.deny_rules().iter()
            .map(|e| ScopeRule::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(allow, deny))
    }

    /// Convenience constructor from raw rule strings.
    pub fn from_rules(allow: &[&str], deny: &[&str]) -> Result<Self, ScopeError> {
        let allow = allow.iter().map(|e| ScopeRule::parse(e)).collect::<Result<Vec<_>, _>>()?;
        let deny = deny.iter().map(|e| ScopeRule::parse(e)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(allow, deny))
    }

    pub fn is_acceptable_target(&self, candidate: &str) -> bool {
        self.explain(candidate).is_ok()
    }

    /// Like [`is_acceptable_target`](Self::is_acceptable_target) but returns
    /// the normalized target, or the reason it was refused.
    pub fn explain(&self, candidate: &str) -> Result<ScopeTarget, ScopeError> {
        let target = ScopeTarget::parse(candidate)?;

        if let Some(rule) = self.deny.iter().find(|r| r.matches(&target)) {
            debug!(target = %target, rule = %rule, "Target matched deny rule");
            return Err(ScopeError::Validation(format!("{} is excluded from scope", target)));
        }

        if !self.allow.iter().any(|r| r.matches(&target)) {
            debug!(target = %target, "Target matched no allow rule");
            return Err(ScopeError::Validation(format!("{} is not in scope", target)));
        }

        Ok(target)
    }

    pub fn allow_rules(&self) -> &[ScopeRule] {
        &self.allow
    }

    pub fn deny_rules(&self) -> &[ScopeRule] {
        &self.deny
    }
}
