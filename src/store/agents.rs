// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Agent profile operations.
//!
//! Profiles are keyed by name (the canonical agent identity); the profile
//! row id doubles as the discovery card id and is kept in a reverse lookup
//! table. Names are immutable once set and never hard-deleted.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::db::{AGENTS, AGENT_IDS};
use super::{MatchDb, StoreError, StoreResult};

/// An agent profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentProfile {
    /// Row id; shown as the card id during discovery
    pub id: String,
    /// Unique, immutable name. Restricted to `[A-Za-z0-9_-]`; names appear
    /// verbatim inside composite index keys.
    pub name: String,
    pub bio: String,
    /// Ordered list, preserved exactly as submitted
    pub skills: Vec<String>,
    /// Ordered list, preserved exactly as submitted
    pub looking_for: Vec<String>,
    #[serde(default)]
    pub current_project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied to an existing profile. `None` fields are left
/// untouched; the name is never updatable.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfilePatch {
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub looking_for: Option<Vec<String>>,
    pub current_project: Option<String>,
    pub avatar_url: Option<String>,
}

/// Check that a name is usable as an agent identity.
pub fn validate_agent_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.len() > 50 {
        return Err(StoreError::InvalidInput(
            "agent name must be 1-50 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::InvalidInput(
            "agent name may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

impl MatchDb {
    /// Create a new agent profile.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    pub fn create_agent(
        &self,
        name: &str,
        bio: &str,
        skills: Vec<String>,
        looking_for: Vec<String>,
        current_project: Option<String>,
        avatar_url: Option<String>,
    ) -> StoreResult<AgentProfile> {
        validate_agent_name(name)?;

        let now = Utc::now();
        let profile = AgentProfile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            bio: bio.to_string(),
            skills,
            looking_for,
            current_project: current_project.unwrap_or_default(),
            avatar_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_vec(&profile)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut agents = write_txn.open_table(AGENTS)?;
            if agents.get(name)?.is_some() {
                return Err(StoreError::AlreadyExists(format!("Agent {name}")));
            }
            agents.insert(name, json.as_slice())?;

            let mut ids = write_txn.open_table(AGENT_IDS)?;
            ids.insert(profile.id.as_str(), name)?;
        }
        write_txn.commit()?;

        Ok(profile)
    }

    /// Fetch a profile by name.
    pub fn get_agent(&self, name: &str) -> StoreResult<AgentProfile> {
        let read_txn = self.db.begin_read()?;
        let agents = read_txn.open_table(AGENTS)?;
        match agents.get(name)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("Agent {name}"))),
        }
    }

    /// Resolve a profile row id (discovery card id) to the agent's name.
    pub fn agent_name_for_id(&self, id: &str) -> StoreResult<String> {
        let read_txn = self.db.begin_read()?;
        let ids = read_txn.open_table(AGENT_IDS)?;
        match ids.get(id)? {
            Some(value) => Ok(value.value().to_string()),
            None => Err(StoreError::NotFound(format!("Card {id}"))),
        }
    }

    /// Apply a partial update to a profile.
    pub fn update_agent(&self, name: &str, patch: ProfilePatch) -> StoreResult<AgentProfile> {
        let write_txn = self.db.begin_write()?;
        let profile = {
            let mut agents = write_txn.open_table(AGENTS)?;

            let existing_bytes = {
                let existing = agents
                    .get(name)?
                    .ok_or_else(|| StoreError::NotFound(format!("Agent {name}")))?;
                existing.value().to_vec()
            };

            let mut profile: AgentProfile = serde_json::from_slice(&existing_bytes)?;
            if let Some(bio) = patch.bio {
                profile.bio = bio;
            }
            if let Some(skills) = patch.skills {
                profile.skills = skills;
            }
            if let Some(looking_for) = patch.looking_for {
                profile.looking_for = looking_for;
            }
            if let Some(current_project) = patch.current_project {
                profile.current_project = current_project;
            }
            if let Some(avatar_url) = patch.avatar_url {
                profile.avatar_url = Some(avatar_url);
            }
            profile.updated_at = Utc::now();

            let json = serde_json::to_vec(&profile)?;
            agents.insert(name, json.as_slice())?;
            profile
        };
        write_txn.commit()?;

        Ok(profile)
    }

    /// List active profiles other than `exclude`, up to `limit`.
    ///
    /// This backs discovery; the caller clamps `limit`.
    pub fn list_candidates(&self, exclude: &str, limit: usize) -> StoreResult<Vec<AgentProfile>> {
        let read_txn = self.db.begin_read()?;
        let agents = read_txn.open_table(AGENTS)?;

        let mut candidates = Vec::new();
        for entry in agents.iter()? {
            let entry = entry?;
            if entry.0.value() == exclude {
                continue;
            }
            let profile: AgentProfile = serde_json::from_slice(entry.1.value())?;
            if !profile.is_active {
                continue;
            }
            candidates.push(profile);
            if candidates.len() >= limit {
                break;
            }
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (MatchDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn create_and_get_roundtrips_ordered_lists() {
        let (db, _dir) = temp_db();
        let skills = vec!["rust".to_string(), "sql".to_string(), "ml".to_string()];
        let looking_for = vec!["cofounder".to_string(), "reviewer".to_string()];
        db.create_agent(
            "alice",
            "systems hacker",
            skills.clone(),
            looking_for.clone(),
            Some("matcher".to_string()),
            None,
        )
        .unwrap();

        let profile = db.get_agent("alice").unwrap();
        assert_eq!(profile.skills, skills);
        assert_eq!(profile.looking_for, looking_for);
        assert_eq!(profile.current_project, "matcher");
        assert!(profile.is_active);
    }

    #[test]
    fn duplicate_name_conflicts() {
        let (db, _dir) = temp_db();
        db.create_agent("alice", "bio", vec![], vec![], None, None)
            .unwrap();
        let err = db
            .create_agent("alice", "other", vec![], vec![], None, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn name_charset_is_enforced() {
        let (db, _dir) = temp_db();
        let err = db
            .create_agent("al|ce", "bio", vec![], vec![], None, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));

        let err = db
            .create_agent("", "bio", vec![], vec![], None, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn card_id_resolves_to_name() {
        let (db, _dir) = temp_db();
        let profile = db
            .create_agent("bob", "bio", vec![], vec![], None, None)
            .unwrap();
        assert_eq!(db.agent_name_for_id(&profile.id).unwrap(), "bob");
        assert!(matches!(
            db.agent_name_for_id("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn patch_updates_only_provided_fields() {
        let (db, _dir) = temp_db();
        db.create_agent(
            "alice",
            "bio",
            vec!["rust".to_string()],
            vec![],
            None,
            None,
        )
        .unwrap();

        let patch = ProfilePatch {
            bio: Some("new bio".to_string()),
            ..Default::default()
        };
        let updated = db.update_agent("alice", patch).unwrap();
        assert_eq!(updated.bio, "new bio");
        assert_eq!(updated.skills, vec!["rust".to_string()]);
    }

    #[test]
    fn candidates_exclude_self() {
        let (db, _dir) = temp_db();
        db.create_agent("alice", "a", vec![], vec![], None, None)
            .unwrap();
        db.create_agent("bob", "b", vec![], vec![], None, None)
            .unwrap();

        let cards = db.list_candidates("alice", 50).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "bob");

        // No other agents -> no cards
        let db2 = temp_db();
        db2.0
            .create_agent("solo", "s", vec![], vec![], None, None)
            .unwrap();
        assert!(db2.0.list_candidates("solo", 50).unwrap().is_empty());
    }
}
