// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Discovery feed and trending list.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::response::{ok, Envelope},
    auth::Auth,
    error::ApiError,
    state::AppState,
};

/// Bounds for the discovery page size.
const MIN_LIMIT: usize = 1;
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DiscoverQuery {
    /// Number of cards to return; clamped to [1, 50], default 1.
    pub limit: Option<usize>,
}

/// A swipeable card: the profile row id plus the public slice of the profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct Card {
    pub id: String,
    pub agent: CardAgent,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardAgent {
    pub name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub looking_for: Vec<String>,
    pub current_project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscoverResponse {
    pub cards: Vec<Card>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingResponse {
    pub trending: Vec<TrendingEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingEntry {
    pub name: String,
    pub bio: String,
    pub rank: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/discover",
    params(DiscoverQuery),
    tag = "Discovery",
    responses(
        (status = 200, description = "Cards to swipe on", body = Envelope<DiscoverResponse>)
    )
)]
pub async fn discover(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<Envelope<DiscoverResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(MIN_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT);

    let cards = state
        .db
        .list_candidates(&agent.agent_id, limit)?
        .into_iter()
        .map(|profile| Card {
            id: profile.id,
            agent: CardAgent {
                name: profile.name,
                bio: profile.bio,
                skills: profile.skills,
                looking_for: profile.looking_for,
                current_project: profile.current_project,
                avatar_url: profile.avatar_url,
            },
        })
        .collect();

    Ok(ok(DiscoverResponse { cards }))
}

#[utoipa::path(
    get,
    path = "/api/v1/trending",
    tag = "Discovery",
    responses(
        (status = 200, description = "Trending agents", body = Envelope<TrendingResponse>)
    )
)]
pub async fn trending(
    Auth(agent): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<TrendingResponse>>, ApiError> {
    let trending = state
        .db
        .list_candidates(&agent.agent_id, 10)?
        .into_iter()
        .enumerate()
        .map(|(idx, profile)| TrendingEntry {
            name: profile.name,
            bio: profile.bio,
            rank: idx + 1,
        })
        .collect();

    Ok(ok(TrendingResponse { trending }))
}
