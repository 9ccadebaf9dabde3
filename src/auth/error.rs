// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

/// Authentication failure.
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header present
    MissingAuthHeader,
    /// Header present but not `Bearer <key>`
    InvalidAuthHeader,
    /// Key unknown or past its expiry
    InvalidKey,
    /// Store failure while validating
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    timestamp: String,
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidKey => "invalid_api_key",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidKey => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => {
                Some("Include Authorization: Bearer YOUR_API_KEY header".to_string())
            }
            AuthError::InvalidKey => {
                Some("Get a new API key from POST /api/v1/auth/register".to_string())
            }
            AuthError::Internal(_) => None,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(
                    f,
                    "Invalid authorization header format (expected 'Bearer <key>')"
                )
            }
            AuthError::InvalidKey => write!(f, "Invalid or expired API key"),
            AuthError::Internal(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "authentication store failure");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            error: self.error_code().to_string(),
            message: self.to_string(),
            hint: self.hint(),
            timestamp: Utc::now().to_rfc3339(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401_envelope() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "missing_auth_header");
        assert!(body["hint"]
            .as_str()
            .unwrap()
            .contains("Authorization: Bearer"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn invalid_key_hints_at_registration() {
        let response = AuthError::InvalidKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert!(body["hint"]
            .as_str()
            .unwrap()
            .contains("/api/v1/auth/register"));
    }

    #[tokio::test]
    async fn internal_error_returns_500() {
        let response = AuthError::Internal("disk".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
