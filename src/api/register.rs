// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! API key issuance.
//!
//! Registration requires an existing profile; the plaintext key is returned
//! exactly once and only its digest is persisted.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::response::{created, Envelope},
    auth::credentials::{generate_key, hash_key},
    error::ApiError,
    state::AppState,
    store::agents::validate_agent_name,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(rename = "agentName")]
    pub agent_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "agentName")]
    pub agent_name: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "API key issued", body = Envelope<RegisterResponse>),
        (status = 404, description = "No profile with that name")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<RegisterResponse>>), ApiError> {
    validate_agent_name(&request.agent_name)?;

    // The profile must exist before a key is issued
    if state.db.get_agent(&request.agent_name).is_err() {
        return Err(ApiError::not_found("Agent not found")
            .with_hint("Create a profile first with POST /api/v1/agents/profile"));
    }

    let api_key =
        generate_key().map_err(|_| ApiError::internal("Failed to generate API key"))?;
    let expires_at = state
        .db
        .insert_api_key(&hash_key(&api_key), &request.agent_name)?;

    tracing::info!(agent = %request.agent_name, "issued API key");

    Ok(created(RegisterResponse {
        api_key,
        agent_name: request.agent_name,
        expires_at: expires_at.to_rfc3339(),
        message: "API key generated successfully. Store it securely - it will not be shown again."
            .to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MatchDb;

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        (AppState::new(db), dir)
    }

    #[tokio::test]
    async fn register_requires_existing_profile() {
        let (state, _dir) = test_state();
        let err = register(
            State(state),
            Json(RegisterRequest {
                agent_name: "ghost".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.hint.unwrap().contains("/api/v1/agents/profile"));
    }

    #[tokio::test]
    async fn register_issues_usable_key() {
        let (state, _dir) = test_state();
        state
            .db
            .create_agent("alice", "bio", vec![], vec![], None, None)
            .unwrap();

        let (status, Json(envelope)) = register(
            State(state.clone()),
            Json(RegisterRequest {
                agent_name: "alice".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.data.api_key.len(), 64);

        // The issued key resolves back to the agent
        let agent = state
            .db
            .validate_api_key(&hash_key(&envelope.data.api_key))
            .unwrap();
        assert_eq!(agent, "alice");
    }

    #[tokio::test]
    async fn register_rejects_bad_names() {
        let (state, _dir) = test_state();
        let err = register(
            State(state),
            Json(RegisterRequest {
                agent_name: "no spaces allowed".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
