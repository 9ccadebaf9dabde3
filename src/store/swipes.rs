// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Swipe recording and mutual-match detection.
//!
//! A swipe is recorded and the mutual check runs inside the same write
//! transaction, so two concurrent mutual swipes serialize and exactly one
//! match row is created per agent pair. The pair guard table also makes
//! repeat mutual swipes (swipes are never deduplicated) return the existing
//! match instead of minting a second one.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::db::{
    scope_prefix, scope_prefix_end, AGENTS, AGENT_IDS, MATCHES, MATCH_INDEX, MATCH_PAIRS,
    SWIPES, SWIPE_INDEX,
};
use super::{AgentProfile, MatchDb, StoreError, StoreResult};

/// Swipe direction. Only `Right` and `Super` count towards a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
    Super,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Super => "super",
        }
    }

    fn likes(s: &str) -> bool {
        s == "right" || s == "super"
    }
}

/// One recorded swipe. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swipe {
    pub id: String,
    /// Swiper's agent name
    pub agent_id: String,
    /// Profile row id of the card swiped on
    pub card_id: String,
    pub direction: SwipeDirection,
    pub created_at: DateTime<Utc>,
}

/// Match status. Transitions `Active` -> `Unmatched` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Unmatched,
}

/// A mutual match between two agents.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchRecord {
    pub id: String,
    pub agent1_id: String,
    pub agent2_id: String,
    pub matched_at: DateTime<Utc>,
    pub status: MatchStatus,
}

impl MatchRecord {
    /// The participant other than `agent`, if `agent` is a participant.
    pub fn counterpart(&self, agent: &str) -> Option<&str> {
        if self.agent1_id == agent {
            Some(&self.agent2_id)
        } else if self.agent2_id == agent {
            Some(&self.agent1_id)
        } else {
            None
        }
    }
}

/// Result of recording a swipe.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SwipeOutcome {
    pub swiped: bool,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    /// Name of the matched agent, when a match was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<String>,
}

/// Pair guard key: the two names in lexicographic order.
fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

impl MatchDb {
    /// Record a swipe by `swiper` on the card `card_id` and detect a mutual
    /// match.
    ///
    /// The card must resolve to an existing agent (`NotFound` otherwise) and
    /// may not be the swiper's own profile. On a right/super swipe the
    /// engine checks whether the card's agent already right/super-swiped the
    /// swiper; if so a match is created (or the existing active one
    /// returned). Once a pair has unmatched, further swipes on that pair are
    /// recorded but never report a match.
    pub fn record_swipe(
        &self,
        swiper: &str,
        card_id: &str,
        direction: SwipeDirection,
    ) -> StoreResult<SwipeOutcome> {
        let now = Utc::now();
        let swipe = Swipe {
            id: Uuid::new_v4().to_string(),
            agent_id: swiper.to_string(),
            card_id: card_id.to_string(),
            direction,
            created_at: now,
        };
        let swipe_json = serde_json::to_vec(&swipe)?;

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let ids = write_txn.open_table(AGENT_IDS)?;
            let card_owner = ids
                .get(card_id)?
                .map(|v| v.value().to_string())
                .ok_or_else(|| StoreError::NotFound(format!("Card {card_id}")))?;
            if card_owner == swiper {
                return Err(StoreError::InvalidInput(
                    "cannot swipe on your own profile".to_string(),
                ));
            }

            let agents = write_txn.open_table(AGENTS)?;
            let swiper_profile: AgentProfile = {
                let raw = agents
                    .get(swiper)?
                    .ok_or_else(|| StoreError::NotFound(format!("Agent {swiper}")))?;
                serde_json::from_slice(raw.value())?
            };

            let mut swipes = write_txn.open_table(SWIPES)?;
            swipes.insert(swipe.id.as_str(), swipe_json.as_slice())?;

            let mut swipe_index = write_txn.open_table(SWIPE_INDEX)?;
            let index_key = format!("{swiper}|{card_id}|{}", swipe.id);
            swipe_index.insert(index_key.as_bytes(), direction.as_str())?;

            if direction == SwipeDirection::Left {
                SwipeOutcome {
                    swiped: true,
                    matched: false,
                    match_id: None,
                    matched_with: None,
                }
            } else {
                let mut pairs = write_txn.open_table(MATCH_PAIRS)?;
                let pair = pair_key(swiper, &card_owner);

                let guarded = pairs.get(pair.as_str())?.map(|v| v.value().to_string());

                if let Some(match_id) = guarded {
                    // The pair matched on an earlier mutual swipe. Report it
                    // only while the match is still active; an unmatched pair
                    // never re-matches.
                    let matches = write_txn.open_table(MATCHES)?;
                    let active = match matches.get(match_id.as_str())? {
                        Some(raw) => {
                            let record: MatchRecord = serde_json::from_slice(raw.value())?;
                            record.status == MatchStatus::Active
                        }
                        None => false,
                    };

                    if active {
                        SwipeOutcome {
                            swiped: true,
                            matched: true,
                            match_id: Some(match_id),
                            matched_with: Some(card_owner),
                        }
                    } else {
                        SwipeOutcome {
                            swiped: true,
                            matched: false,
                            match_id: None,
                            matched_with: None,
                        }
                    }
                } else {
                    // Does the card's agent already like me back? Their swipe
                    // targets my profile row id.
                    let reverse_scope = format!("{card_owner}|{}", swiper_profile.id);
                    let start = scope_prefix(&reverse_scope);
                    let end = scope_prefix_end(&reverse_scope);
                    let mut liked_back = false;
                    for entry in swipe_index.range(start.as_slice()..end.as_slice())? {
                        let entry = entry?;
                        if SwipeDirection::likes(entry.1.value()) {
                            liked_back = true;
                            break;
                        }
                    }

                    if liked_back {
                        let record = MatchRecord {
                            id: Uuid::new_v4().to_string(),
                            agent1_id: swiper.to_string(),
                            agent2_id: card_owner.clone(),
                            matched_at: now,
                            status: MatchStatus::Active,
                        };
                        let match_json = serde_json::to_vec(&record)?;

                        let mut matches = write_txn.open_table(MATCHES)?;
                        matches.insert(record.id.as_str(), match_json.as_slice())?;
                        pairs.insert(pair.as_str(), record.id.as_str())?;

                        let mut match_index = write_txn.open_table(MATCH_INDEX)?;
                        let k1 = format!("{swiper}|{}", record.id);
                        let k2 = format!("{card_owner}|{}", record.id);
                        match_index.insert(k1.as_bytes(), card_owner.as_str())?;
                        match_index.insert(k2.as_bytes(), swiper)?;

                        SwipeOutcome {
                            swiped: true,
                            matched: true,
                            match_id: Some(record.id),
                            matched_with: Some(card_owner),
                        }
                    } else {
                        SwipeOutcome {
                            swiped: true,
                            matched: false,
                            match_id: None,
                            matched_with: None,
                        }
                    }
                }
            }
        };
        write_txn.commit()?;

        Ok(outcome)
    }

    /// Fetch a match by id.
    pub fn get_match(&self, match_id: &str) -> StoreResult<MatchRecord> {
        let read_txn = self.db.begin_read()?;
        let matches = read_txn.open_table(MATCHES)?;
        match matches.get(match_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("Match {match_id}"))),
        }
    }

    /// List an agent's active matches.
    pub fn list_matches(&self, agent: &str) -> StoreResult<Vec<MatchRecord>> {
        let read_txn = self.db.begin_read()?;
        let match_index = read_txn.open_table(MATCH_INDEX)?;
        let matches = read_txn.open_table(MATCHES)?;

        let start = scope_prefix(agent);
        let end = scope_prefix_end(agent);

        let mut result = Vec::new();
        for entry in match_index.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            let key = entry.0.value().to_vec();
            let match_id = match String::from_utf8(key[start.len()..].to_vec()) {
                Ok(id) => id,
                Err(_) => continue,
            };
            if let Some(raw) = matches.get(match_id.as_str())? {
                let record: MatchRecord = serde_json::from_slice(raw.value())?;
                if record.status == MatchStatus::Active {
                    result.push(record);
                }
            }
        }

        Ok(result)
    }

    /// Set a match's status to unmatched.
    ///
    /// Idempotent: unmatching an already-unmatched row is a no-op success.
    /// Only a participant may unmatch.
    pub fn unmatch(&self, match_id: &str, requester: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut matches = write_txn.open_table(MATCHES)?;

            let existing_bytes = {
                let existing = matches
                    .get(match_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Match {match_id}")))?;
                existing.value().to_vec()
            };

            let mut record: MatchRecord = serde_json::from_slice(&existing_bytes)?;
            if record.counterpart(requester).is_none() {
                return Err(StoreError::Forbidden(
                    "only a participant may unmatch".to_string(),
                ));
            }

            if record.status != MatchStatus::Unmatched {
                record.status = MatchStatus::Unmatched;
                let json = serde_json::to_vec(&record)?;
                matches.insert(match_id, json.as_slice())?;
            }
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Number of swipes an agent has made.
    pub fn count_swipes_by(&self, agent: &str) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let swipe_index = read_txn.open_table(SWIPE_INDEX)?;
        let start = scope_prefix(agent);
        let end = scope_prefix_end(agent);
        let mut count = 0u64;
        for entry in swipe_index.range(start.as_slice()..end.as_slice())? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}
