// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Authentication middleware for Axum.
//!
//! Applied to the whole API router with
//! `axum::middleware::from_fn_with_state(state, auth_middleware)`. It
//! resolves the bearer credential once, stashes the
//! [`AuthenticatedAgent`](super::AuthenticatedAgent) in request extensions
//! for the `Auth` extractor, and appends deprecation
//! headers to responses authenticated with a legacy key.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::credentials::{Credential, MIGRATION_DEADLINE};
use super::AuthError;
use crate::state::AppState;

/// Paths reachable without a credential.
const PUBLIC_PATHS: &[&str] = &[
    "/health",
    "/docs",
    "/api-doc",
    "/api/v1/auth/register",
    "/api/v1/agents/profile",
];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path == *p || path.starts_with(&format!("{p}/")))
}

/// Authentication middleware function.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let auth_header = match request.headers().get(AUTHORIZATION) {
        Some(header) => header,
        None => return AuthError::MissingAuthHeader.into_response(),
    };

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => return AuthError::InvalidAuthHeader.into_response(),
    };

    let token = match auth_str.strip_prefix("Bearer ") {
        Some(t) => t.trim(),
        None => return AuthError::InvalidAuthHeader.into_response(),
    };
    if token.is_empty() {
        return AuthError::InvalidAuthHeader.into_response();
    }

    let agent = match Credential::parse(token).resolve(&state.db) {
        Ok(agent) => agent,
        Err(e) => return e.into_response(),
    };

    let legacy = agent.legacy;
    request.extensions_mut().insert(agent);
    let mut response = next.run(request).await;

    if legacy {
        let headers = response.headers_mut();
        headers.insert("X-API-Key-Deprecated", HeaderValue::from_static("true"));
        headers.insert(
            "X-API-Key-Migration-Deadline",
            HeaderValue::from_static(MIGRATION_DEADLINE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_match_exactly_or_by_prefix() {
        assert!(is_public("/health"));
        assert!(is_public("/docs"));
        assert!(is_public("/docs/index.html"));
        assert!(is_public("/api-doc/openapi.json"));
        assert!(is_public("/api/v1/auth/register"));
        assert!(is_public("/api/v1/agents/profile"));

        assert!(!is_public("/api/v1/agents/me"));
        assert!(!is_public("/api/v1/discover"));
        // Prefix must end at a segment boundary
        assert!(!is_public("/healthz"));
    }

    #[tokio::test]
    async fn unauthenticated_request_gets_envelope() {
        use crate::state::AppState;
        use crate::store::MatchDb;
        use axum::routing::get;
        use axum::Router;
        use std::sync::Arc;
        use tower::ServiceExt;

        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        let state = AppState { db: Arc::new(db) };

        let app = Router::new()
            .route("/api/v1/discover", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/discover")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn legacy_key_passes_and_marks_response() {
        use crate::state::AppState;
        use crate::store::MatchDb;
        use axum::routing::get;
        use axum::Router;
        use std::sync::Arc;
        use tower::ServiceExt;

        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        let state = AppState { db: Arc::new(db) };

        let app = Router::new()
            .route("/api/v1/discover", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/discover")
                    .header("Authorization", "Bearer alice_key")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response.headers().get("X-API-Key-Deprecated").unwrap(),
            "true"
        );
        assert_eq!(
            response
                .headers()
                .get("X-API-Key-Migration-Deadline")
                .unwrap(),
            MIGRATION_DEADLINE
        );
    }
}
