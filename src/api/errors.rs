use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::ScopeError;

impl IntoResponse for ScopeError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ScopeError::Validation(_) => StatusCode::BAD_REQUEST,
            ScopeError::Conflict(_) => StatusCode::CONFLICT,
            ScopeError::NotFound(_) => StatusCode::NOT_FOUND,
            ScopeError::InvalidTransition(_) => StatusCode::CONFLICT,
            ScopeError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ScopeError::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let classification = self.classify();

        (status, Json(json!({
            "error": self.to_string(),
            "error_type": classification.error_type,
            "retryable": classification.retryable,
        }))).into_response()
    }
}
