// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Swiping, match listing and unmatching.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::response::{ok, Envelope},
    auth::Auth,
    error::ApiError,
    state::AppState,
    store::{SwipeDirection, SwipeOutcome},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwipeRequest {
    pub card_id: String,
    /// One of `left`, `right`, `super`
    pub direction: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MatchesResponse {
    pub matches: Vec<MatchSummary>,
    pub count: usize,
}

/// One row of the match list: the counterpart profile slice plus
/// conversation state.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    pub id: String,
    pub agent: MatchAgent,
    pub matched_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    pub unread_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MatchAgent {
    pub name: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnmatchResponse {
    pub unmatched: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/swipe",
    request_body = SwipeRequest,
    tag = "Matching",
    responses(
        (status = 200, description = "Swipe recorded", body = Envelope<SwipeOutcome>),
        (status = 404, description = "Unknown card")
    )
)]
pub async fn swipe(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<SwipeRequest>,
) -> Result<Json<Envelope<SwipeOutcome>>, ApiError> {
    let direction = match request.direction.as_str() {
        "left" => SwipeDirection::Left,
        "right" => SwipeDirection::Right,
        "super" => SwipeDirection::Super,
        other => {
            return Err(
                ApiError::bad_request(format!("Invalid direction: {other}"))
                    .with_hint("Use left, right or super"),
            )
        }
    };

    let outcome = state
        .db
        .record_swipe(&agent.agent_id, &request.card_id, direction)?;

    if outcome.matched {
        tracing::info!(
            agent = %agent.agent_id,
            matched_with = outcome.matched_with.as_deref().unwrap_or(""),
            "mutual match"
        );
    }

    Ok(ok(outcome))
}

#[utoipa::path(
    get,
    path = "/api/v1/matches",
    tag = "Matching",
    responses(
        (status = 200, description = "Active matches", body = Envelope<MatchesResponse>)
    )
)]
pub async fn list_matches(
    Auth(agent): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<MatchesResponse>>, ApiError> {
    let records = state.db.list_matches(&agent.agent_id)?;

    let mut matches = Vec::with_capacity(records.len());
    for record in records {
        let Some(other) = record.counterpart(&agent.agent_id) else {
            continue;
        };
        let profile = state.db.get_agent(other)?;

        let recent = state.db.list_messages(&record.id, 50)?;
        let last_message = recent.first().map(|m| m.content.clone());
        let unread_count = recent
            .iter()
            .filter(|m| m.author_id != agent.agent_id && !m.read)
            .count() as u64;

        matches.push(MatchSummary {
            id: record.id,
            agent: MatchAgent {
                name: profile.name,
                bio: profile.bio,
                avatar_url: profile.avatar_url,
            },
            matched_at: record.matched_at.to_rfc3339(),
            last_message,
            unread_count,
        });
    }

    let count = matches.len();
    Ok(ok(MatchesResponse { matches, count }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/matches/{match_id}",
    params(
        ("match_id" = String, Path, description = "Match to unmatch")
    ),
    tag = "Matching",
    responses(
        (status = 200, description = "Unmatched", body = Envelope<UnmatchResponse>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn unmatch(
    Auth(agent): Auth,
    Path(match_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<UnmatchResponse>>, ApiError> {
    state.db.unmatch(&match_id, &agent.agent_id)?;
    Ok(ok(UnmatchResponse { unmatched: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedAgent;
    use crate::store::MatchDb;

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

    async fn matched_pair(state: &AppState) -> String {
        state
            .db
            .create_agent("alice", "a", vec![], vec![], None, None)
            .unwrap();
        let bob = state
            .db
            .create_agent("bob", "b", vec![], vec![], None, None)
            .unwrap();
        let alice = state.db.get_agent("alice").unwrap();

        state
            .db
            .record_swipe("alice", &bob.id, SwipeDirection::Right)
            .unwrap();
        let outcome = state
            .db
            .record_swipe("bob", &alice.id, SwipeDirection::Right)
            .unwrap();
        outcome.match_id.unwrap()
    }

    #[tokio::test]
    async fn swipe_reports_match_state() {
        let (state, _dir) = test_state();
        state
            .db
            .create_agent("alice", "a", vec![], vec![], None, None)
            .unwrap();
        let bob = state
            .db
            .create_agent("bob", "b", vec![], vec![], None, None)
            .unwrap();

        let Json(envelope) = swipe(
            as_agent("alice"),
            State(state),
            Json(SwipeRequest {
                card_id: bob.id,
                direction: "right".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(envelope.data.swiped);
        assert!(!envelope.data.matched);
    }

    #[tokio::test]
    async fn unknown_direction_is_bad_request() {
        let (state, _dir) = test_state();
        state
            .db
            .create_agent("alice", "a", vec![], vec![], None, None)
            .unwrap();
        let bob = state
            .db
            .create_agent("bob", "b", vec![], vec![], None, None)
            .unwrap();

        let err = swipe(
            as_agent("alice"),
            State(state.clone()),
            Json(SwipeRequest {
                card_id: bob.id,
                direction: "up".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        // The swipe was not recorded
        assert_eq!(state.db.count_swipes_by("alice").unwrap(), 0);
    }

    #[tokio::test]
    async fn match_list_carries_conversation_state() {
        let (state, _dir) = test_state();
        let match_id = matched_pair(&state).await;
        state.db.append_message(&match_id, "bob", "hello").unwrap();

        let Json(envelope) = list_matches(as_agent("alice"), State(state)).await.unwrap();
        assert_eq!(envelope.data.count, 1);
        let summary = &envelope.data.matches[0];
        assert_eq!(summary.agent.name, "bob");
        assert_eq!(summary.last_message.as_deref(), Some("hello"));
        assert_eq!(summary.unread_count, 1);
    }

    #[tokio::test]
    async fn unmatch_removes_from_both_lists() {
        let (state, _dir) = test_state();
        let match_id = matched_pair(&state).await;

        let Json(envelope) = unmatch(
            as_agent("alice"),
            Path(match_id),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert!(envelope.data.unmatched);

        let Json(envelope) = list_matches(as_agent("bob"), State(state)).await.unwrap();
        assert_eq!(envelope.data.count, 0);
    }

    #[tokio::test]
    async fn unmatch_by_outsider_is_forbidden() {
        let (state, _dir) = test_state();
        let match_id = matched_pair(&state).await;
        state
            .db
            .create_agent("carol", "c", vec![], vec![], None, None)
            .unwrap();

        let err = unmatch(as_agent("carol"), Path(match_id), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }
}
