use std::path::Path;
use crate::errors::ScopeError;
use crate::scope::ScopeRule;
use super::types::ScanscopeConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<ScanscopeConfig, ScopeError> {
    if !path.exists() {
        return Err(ScopeError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(ScopeError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<ScanscopeConfig, ScopeError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // An empty file parses as null
    if yaml.is_null() {
        return Ok(ScanscopeConfig::default());
    }

    validate_security_patterns(&yaml)?;
    validate_schema(&yaml)?;

    let config: ScanscopeConfig = serde_yaml::from_value(yaml)?;
    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), ScopeError> {
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| ScopeError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| ScopeError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| ScopeError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; typed parsing below is the hard gate
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &ScanscopeConfig) -> Result<(), ScopeError> {
    let mut allow = Vec::new();
    for entry in config.allow_rules() {
        allow.push(ScopeRule::parse(entry)?);
    }
    let mut deny = Vec::new();
    for entry in config.deny_rules() {
        deny.push(ScopeRule::parse(entry)?);
    }

    for a in &allow {
        if deny.contains(a) {
            return Err(ScopeError::Config(format!(
                "Conflicting scope rules: '{}' appears in both allow and deny lists",
                a
            )));
        }
    }

    if let Some(dispatch) = &config.dispatch {
        if dispatch.timeout_secs == Some(0) {
            return Err(ScopeError::Config("dispatch.timeout_secs must be greater than zero".into()));
        }
        if dispatch.sweep_interval_secs == Some(0) {
            return Err(ScopeError::Config("dispatch.sweep_interval_secs must be greater than zero".into()));
        }
    }

    if config.results.as_ref().and_then(|r| r.per_page) == Some(0) {
        return Err(ScopeError::Config("results.per_page must be greater than zero".into()));
    }

    if allow.is_empty() {
        warn!("No scope allow rules configured; every rescan request will be rejected");
    }

    Ok(())
}
