//! HTTP error responses.
//!
//! Every rejection is a JSON body `{"error": "<message>"}`. Internal detail
//! stays in the logs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_application::{AuthError, ChatError, StoreError, TraceError};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Unauthorized(AuthError::Unavailable(detail)) => {
                warn!(error = %detail, "Credential backend unavailable");
                ApiError::Unavailable("Authentication is temporarily unavailable".to_string())
            }
            ChatError::Unauthorized(e) => ApiError::Unauthorized(e.to_string()),
            e @ ChatError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            e @ (ChatError::AgentNotFound(_) | ChatError::ConversationNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
            ChatError::InvalidRequest(message) => ApiError::BadRequest(message),
            ChatError::Store(e) => e.into(),
        }
    }
}

impl From<TraceError> for ApiError {
    fn from(err: TraceError) -> Self {
        match err {
            TraceError::InvalidWindow(message) => ApiError::BadRequest(message),
            TraceError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        warn!(error = %err, "Storage failure while serving request");
        ApiError::Unavailable("Storage is temporarily unavailable".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{AgentId, TenantId};

    #[test]
    fn test_chat_error_status_mapping() {
        let cases = [
            (
                ChatError::Unauthorized(AuthError::MissingCredential),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ChatError::Forbidden(TenantId::new("s")),
                StatusCode::FORBIDDEN,
            ),
            (
                ChatError::AgentNotFound(AgentId::new("a")),
                StatusCode::NOT_FOUND,
            ),
            (
                ChatError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ChatError::Store(StoreError::Unavailable("x".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_store_detail_not_leaked() {
        let err = ApiError::from(StoreError::Query("SELECT secret".to_string()));
        assert!(!err.to_string().contains("secret"));
    }
}
