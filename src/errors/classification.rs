use super::types::ScopeError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl ScopeError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient infrastructure failures
            ScopeError::StoreUnavailable(_) => ErrorClassification {
                error_type: "StoreUnavailableError",
                retryable: true,
            },
            ScopeError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            ScopeError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },

            // Caller mistakes and race guards
            ScopeError::Validation(_) => ErrorClassification {
                error_type: "ValidationError",
                retryable: false,
            },
            ScopeError::Conflict(_) => ErrorClassification {
                error_type: "ConflictError",
                retryable: false,
            },
            ScopeError::NotFound(_) => ErrorClassification {
                error_type: "NotFoundError",
                retryable: false,
            },
            ScopeError::InvalidTransition(_) => ErrorClassification {
                error_type: "InvalidTransitionError",
                retryable: false,
            },
            ScopeError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            ScopeError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            ScopeError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },

            ScopeError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                retryable: false,
            },
            ScopeError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.classify().retryable
    }
}
