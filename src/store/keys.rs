// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Credential store operations.
//!
//! Only the SHA-256 digest of an issued key is persisted; the plaintext is
//! returned once at issuance and never stored. Issuing a new key does not
//! revoke earlier rows, matching the one-row-per-issuance lifecycle.

use chrono::{DateTime, Duration, Utc};
#[cfg(test)]
use redb::ReadableDatabase;
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::db::API_KEYS;
use super::{MatchDb, StoreError, StoreResult};

/// How long an issued key stays valid.
pub const KEY_TTL_DAYS: i64 = 30;

/// A stored API key row. The digest itself is the table key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Agent name the key authenticates as
    pub agent_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl MatchDb {
    /// Persist a freshly issued key digest with a 30-day expiry.
    ///
    /// Returns the expiry so the caller can report it alongside the
    /// plaintext key.
    pub fn insert_api_key(&self, key_hash: &str, agent_id: &str) -> StoreResult<DateTime<Utc>> {
        let now = Utc::now();
        let record = ApiKeyRecord {
            agent_id: agent_id.to_string(),
            created_at: now,
            expires_at: now + Duration::days(KEY_TTL_DAYS),
            last_used: None,
        };
        let json = serde_json::to_vec(&record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut keys = write_txn.open_table(API_KEYS)?;
            keys.insert(key_hash, json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(record.expires_at)
    }

    /// Resolve a key digest to an agent identity.
    ///
    /// Fails with `NotFound` if no row exists or the row has expired; on
    /// success the row's `last_used` timestamp is refreshed.
    pub fn validate_api_key(&self, key_hash: &str) -> StoreResult<String> {
        let write_txn = self.db.begin_write()?;
        let agent_id = {
            let mut keys = write_txn.open_table(API_KEYS)?;

            let existing_bytes = {
                let existing = keys
                    .get(key_hash)?
                    .ok_or_else(|| StoreError::NotFound("API key".to_string()))?;
                existing.value().to_vec()
            };

            let mut record: ApiKeyRecord = serde_json::from_slice(&existing_bytes)?;
            if record.expires_at <= Utc::now() {
                return Err(StoreError::NotFound("API key".to_string()));
            }

            record.last_used = Some(Utc::now());
            let json = serde_json::to_vec(&record)?;
            keys.insert(key_hash, json.as_slice())?;
            record.agent_id
        };
        write_txn.commit()?;

        Ok(agent_id)
    }

    /// Read a key row without touching `last_used`.
    #[cfg(test)]
    pub fn get_api_key(&self, key_hash: &str) -> StoreResult<ApiKeyRecord> {
        let read_txn = self.db.begin_read()?;
        let keys = read_txn.open_table(API_KEYS)?;
        match keys.get(key_hash)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound("API key".to_string())),
        }
    }
}
