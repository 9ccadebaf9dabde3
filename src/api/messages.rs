// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Per-match messaging endpoints.

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
    store::Message,
};

/// Page size for conversation listing.
const MESSAGE_PAGE: usize = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessagesResponse {
    /// Newest first
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: Message,
}

#[utoipa::path(
    get,
    path = "/api/v1/matches/{match_id}/messages",
    params(
        ("match_id" = String, Path, description = "Match whose conversation to read")
    ),
    tag = "Messaging",
    responses(
        (status = 200, description = "Conversation, newest first", body = Envelope<MessagesResponse>),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn list_messages(
    Auth(_agent): Auth,
    Path(match_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<MessagesResponse>>, ApiError> {
    let messages = state.db.list_messages(&match_id, MESSAGE_PAGE)?;
    Ok(ok(MessagesResponse { messages }))
}

#[utoipa::path(
    post,
    path = "/api/v1/matches/{match_id}/messages",
    params(
        ("match_id" = String, Path, description = "Match to post into")
    ),
    request_body = SendMessageRequest,
    tag = "Messaging",
    responses(
        (status = 201, description = "Message posted", body = Envelope<MessageResponse>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn send_message(
    Auth(agent): Auth,
    Path(match_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Envelope<MessageResponse>>), ApiError> {
    let message = state
        .db
        .append_message(&match_id, &agent.agent_id, &request.content)?;
    Ok(created(MessageResponse { message }))
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

    fn matched_pair(state: &AppState) -> String {
        let alice = state
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
        state
            .db
            .record_swipe("bob", &alice.id, SwipeDirection::Right)
            .unwrap()
            .match_id
            .unwrap()
    }

    #[tokio::test]
    async fn send_and_read_conversation() {
        let (state, _dir) = test_state();
        let match_id = matched_pair(&state);

        let (status, Json(envelope)) = send_message(
            as_agent("alice"),
            Path(match_id.clone()),
            State(state.clone()),
            Json(SendMessageRequest {
                content: "want to pair on a parser?".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.data.message.author_id, "alice");

        let Json(envelope) = list_messages(as_agent("bob"), Path(match_id), State(state))
            .await
            .unwrap();
        assert_eq!(envelope.data.messages.len(), 1);
        assert_eq!(
            envelope.data.messages[0].content,
            "want to pair on a parser?"
        );
    }

    #[tokio::test]
    async fn outsider_cannot_post() {
        let (state, _dir) = test_state();
        let match_id = matched_pair(&state);
        state
            .db
            .create_agent("carol", "c", vec![], vec![], None, None)
            .unwrap();

        let err = send_message(
            as_agent("carol"),
            Path(match_id),
            State(state),
            Json(SendMessageRequest {
                content: "hi".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn oversized_content_is_rejected() {
        let (state, _dir) = test_state();
        let match_id = matched_pair(&state);

        let err = send_message(
            as_agent("alice"),
            Path(match_id),
            State(state),
            Json(SendMessageRequest {
                content: "x".repeat(1001),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
