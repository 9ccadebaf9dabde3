// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Profile endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::response::{created, ok, Envelope},
    auth::Auth,
    error::ApiError,
    state::AppState,
    store::{AgentProfile, ProfilePatch},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    pub name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub looking_for: Vec<String>,
    #[serde(default)]
    pub current_project: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub profile: AgentProfile,
}

/// Per-agent activity counters, computed from the store rather than sampled.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub stats: AgentStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentStats {
    pub swipes_made: u64,
    pub matches: u64,
    pub messages_sent: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/agents/profile",
    request_body = CreateProfileRequest,
    tag = "Agents",
    responses(
        (status = 201, description = "Profile created", body = Envelope<ProfileResponse>),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_profile(
    State(state): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Envelope<ProfileResponse>>), ApiError> {
    if request.bio.is_empty() {
        return Err(ApiError::bad_request("Missing required fields")
            .with_hint("Provide name, bio, skills, looking_for"));
    }

    let profile = state.db.create_agent(
        &request.name,
        &request.bio,
        request.skills,
        request.looking_for,
        request.current_project,
        request.avatar_url,
    )?;

    tracing::info!(agent = %profile.name, "profile created");

    Ok(created(ProfileResponse { profile }))
}

#[utoipa::path(
    get,
    path = "/api/v1/agents/me",
    tag = "Agents",
    responses(
        (status = 200, description = "Own profile", body = Envelope<ProfileResponse>),
        (status = 404, description = "No profile for the authenticated agent")
    )
)]
pub async fn get_me(
    Auth(agent): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<ProfileResponse>>, ApiError> {
    let profile = state.db.get_agent(&agent.agent_id)?;
    Ok(ok(ProfileResponse { profile }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/agents/me",
    request_body = ProfilePatch,
    tag = "Agents",
    responses(
        (status = 200, description = "Updated profile", body = Envelope<ProfileResponse>)
    )
)]
pub async fn update_me(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Envelope<ProfileResponse>>, ApiError> {
    let profile = state.db.update_agent(&agent.agent_id, patch)?;
    Ok(ok(ProfileResponse { profile }))
}

#[utoipa::path(
    get,
    path = "/api/v1/agents/{name}",
    params(
        ("name" = String, Path, description = "Agent name")
    ),
    tag = "Agents",
    responses(
        (status = 200, description = "Agent profile", body = Envelope<ProfileResponse>),
        (status = 404, description = "Unknown agent")
    )
)]
pub async fn get_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<ProfileResponse>>, ApiError> {
    let profile = state.db.get_agent(&name)?;
    Ok(ok(ProfileResponse { profile }))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Agents",
    responses(
        (status = 200, description = "Activity counters", body = Envelope<StatsResponse>)
    )
)]
pub async fn stats(
    Auth(agent): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<StatsResponse>>, ApiError> {
    let swipes_made = state.db.count_swipes_by(&agent.agent_id)?;
    let matches = state.db.list_matches(&agent.agent_id)?;
    let match_ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
    let messages_sent = state.db.count_messages_by(&agent.agent_id, &match_ids)?;

    Ok(ok(StatsResponse {
        stats: AgentStats {
            swipes_made,
            matches: matches.len() as u64,
            messages_sent,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedAgent;
    use crate::store::{MatchDb, SwipeDirection};

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        (AppState::new(db), dir)
    }

    fn as_agent(name: &str) -> Auth {
        Auth(AuthenticatedAgent {
            agent_id: name.to_string(),
            legacy: false,
        })
    }

    #[tokio::test]
    async fn create_then_fetch_profile() {
        let (state, _dir) = test_state();
        let (status, Json(envelope)) = create_profile(
            State(state.clone()),
            Json(CreateProfileRequest {
                name: "alice".to_string(),
                bio: "systems hacker".to_string(),
                skills: vec!["rust".to_string()],
                looking_for: vec!["cofounder".to_string()],
                current_project: None,
                avatar_url: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.data.profile.name, "alice");

        let Json(envelope) = get_me(as_agent("alice"), State(state)).await.unwrap();
        assert_eq!(envelope.data.profile.bio, "systems hacker");
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let (state, _dir) = test_state();
        state
            .db
            .create_agent("alice", "bio", vec![], vec![], None, None)
            .unwrap();

        let err = create_profile(
            State(state),
            Json(CreateProfileRequest {
                name: "alice".to_string(),
                bio: "other".to_string(),
                skills: vec![],
                looking_for: vec![],
                current_project: None,
                avatar_url: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn patch_leaves_missing_fields_untouched() {
        let (state, _dir) = test_state();
        state
            .db
            .create_agent(
                "alice",
                "bio",
                vec!["rust".to_string()],
                vec![],
                None,
                None,
            )
            .unwrap();

        let Json(envelope) = update_me(
            as_agent("alice"),
            State(state),
            Json(ProfilePatch {
                bio: Some("updated".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.profile.bio, "updated");
        assert_eq!(envelope.data.profile.skills, vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn stats_reflect_store_counts() {
        let (state, _dir) = test_state();
        state
            .db
            .create_agent("alice", "a", vec![], vec![], None, None)
            .unwrap();
        let bob = state
            .db
            .create_agent("bob", "b", vec![], vec![], None, None)
            .unwrap();
        state
            .db
            .record_swipe("alice", &bob.id, SwipeDirection::Right)
            .unwrap();

        let Json(envelope) = stats(as_agent("alice"), State(state)).await.unwrap();
        assert_eq!(envelope.data.stats.swipes_made, 1);
        assert_eq!(envelope.data.stats.matches, 0);
        assert_eq!(envelope.data.stats.messages_sent, 0);
    }
}
