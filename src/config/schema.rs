use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "scope": {
                "type": "object",
                "properties": {
                    "allow": { "type": "array", "items": { "type": "string", "minLength": 1 } },
                    "deny": { "type": "array", "items": { "type": "string", "minLength": 1 } }
                }
            },
            "dispatch": {
                "type": "object",
                "properties": {
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "sweep_interval_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "results": {
                "type": "object",
                "properties": {
                    "per_page": { "type": "integer", "minimum": 1, "maximum": 1000 }
                }
            },
            "database": {
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                }
            }
        }
    })
});
