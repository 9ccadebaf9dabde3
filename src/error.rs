// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! API error type and the uniform failure envelope.
//!
//! Every failed request body has the shape
//! `{"success":false,"error":...,"message":...,"hint":...,"timestamp":...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    /// Stable machine-readable code
    pub error: &'static str,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    timestamp: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message,
        )
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            StoreError::AlreadyExists(what) => ApiError::conflict(format!("{what} already exists")),
            StoreError::InsufficientBalance(detail) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "insufficient_balance",
                format!("Insufficient balance: {detail}"),
            ),
            StoreError::Forbidden(detail) => ApiError::forbidden(detail),
            StoreError::InvalidInput(detail) => ApiError::bad_request(detail),
            other => {
                tracing::error!(error = %other, "store operation failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.error.to_string(),
            message: self.message,
            hint: self.hint,
            timestamp: Utc::now().to_rfc3339(),
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_code() {
        let nf = ApiError::not_found("Agent alice not found");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.error, "not_found");

        let conflict = ApiError::conflict("taken");
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let forbidden = ApiError::forbidden("not yours");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let nf: ApiError = StoreError::NotFound("Agent alice".to_string()).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "Agent alice not found");

        let dup: ApiError = StoreError::AlreadyExists("Agent alice".to_string()).into();
        assert_eq!(dup.status, StatusCode::CONFLICT);

        let poor: ApiError = StoreError::InsufficientBalance("balance 10 < 50".to_string()).into();
        assert_eq!(poor.status, StatusCode::BAD_REQUEST);
        assert_eq!(poor.error, "insufficient_balance");

        let forbidden: ApiError = StoreError::Forbidden("nope".to_string()).into();
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let invalid: ApiError = StoreError::InvalidInput("bad".to_string()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err: ApiError =
            StoreError::Serde(serde_json::from_str::<i32>("oops").unwrap_err()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[tokio::test]
    async fn into_response_emits_envelope() {
        let response = ApiError::bad_request("bad data")
            .with_hint("send better data")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "bad data");
        assert_eq!(body["hint"], "send better data");
        assert!(body["timestamp"].is_string());
    }
}
