// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Per-match message log.
//!
//! Messages are stored under a `match_id|!timestamp_be|msg_id` composite key,
//! so listing a match is a prefix range scan in newest-first order.
//! Consumers wanting chronological order reverse the page themselves.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::db::{scope_prefix, scope_prefix_end, time_index_key, MATCHES, MESSAGES};
use super::swipes::MatchRecord;
use super::{MatchDb, StoreError, StoreResult};

/// Maximum message length in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// One message in a match conversation. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: String,
    pub match_id: String,
    /// Author's agent name
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl MatchDb {
    /// Append a message to a match conversation.
    ///
    /// The author must be a participant of the match (`Forbidden` otherwise)
    /// and the content must be non-empty and at most 1000 characters.
    pub fn append_message(
        &self,
        match_id: &str,
        author: &str,
        content: &str,
    ) -> StoreResult<Message> {
        if content.is_empty() || content.chars().count() > MAX_CONTENT_CHARS {
            return Err(StoreError::InvalidInput(format!(
                "content required (max {MAX_CONTENT_CHARS} chars)"
            )));
        }

        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            match_id: match_id.to_string(),
            author_id: author.to_string(),
            content: content.to_string(),
            created_at: now,
            read: false,
        };
        let json = serde_json::to_vec(&message)?;

        let write_txn = self.db.begin_write()?;
        {
            let matches = write_txn.open_table(MATCHES)?;
            let record: MatchRecord = {
                let raw = matches
                    .get(match_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Match {match_id}")))?;
                serde_json::from_slice(raw.value())?
            };
            if record.counterpart(author).is_none() {
                return Err(StoreError::Forbidden(
                    "only match participants may post".to_string(),
                ));
            }

            let mut messages = write_txn.open_table(MESSAGES)?;
            let key = time_index_key(match_id, now.timestamp_millis(), &message.id);
            messages.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(message)
    }

    /// List a match's messages, newest first, bounded by `limit`.
    pub fn list_messages(&self, match_id: &str, limit: usize) -> StoreResult<Vec<Message>> {
        let read_txn = self.db.begin_read()?;
        let matches = read_txn.open_table(MATCHES)?;
        if matches.get(match_id)?.is_none() {
            return Err(StoreError::NotFound(format!("Match {match_id}")));
        }

        let messages = read_txn.open_table(MESSAGES)?;
        let start = scope_prefix(match_id);
        let end = scope_prefix_end(match_id);

        let mut result = Vec::new();
        for entry in messages.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            let message: Message = serde_json::from_slice(entry.1.value())?;
            result.push(message);
            if result.len() >= limit {
                break;
            }
        }

        Ok(result)
    }

    /// Number of messages an agent has authored across a set of matches.
    pub fn count_messages_by(&self, author: &str, match_ids: &[String]) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let messages = read_txn.open_table(MESSAGES)?;

        let mut count = 0u64;
        for match_id in match_ids {
            let start = scope_prefix(match_id);
            let end = scope_prefix_end(match_id);
            for entry in messages.range(start.as_slice()..end.as_slice())? {
                let entry = entry?;
                let message: Message = serde_json::from_slice(entry.1.value())?;
                if message.author_id == author {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SwipeDirection;

    fn matched_pair() -> (MatchDb, tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        let alice = db
            .create_agent("alice", "a", vec![], vec![], None, None)
            .unwrap();
        let bob = db
            .create_agent("bob", "b", vec![], vec![], None, None)
            .unwrap();
        db.record_swipe("alice", &bob.id, SwipeDirection::Right)
            .unwrap();
        let outcome = db
            .record_swipe("bob", &alice.id, SwipeDirection::Right)
            .unwrap();
        let match_id = outcome.match_id.unwrap();
        (db, dir, match_id)
    }

    #[test]
    fn send_and_list_newest_first() {
        let (db, _dir, match_id) = matched_pair();

        db.append_message(&match_id, "alice", "first").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.append_message(&match_id, "bob", "second").unwrap();

        let messages = db.list_messages(&match_id, 50).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "second");
        assert_eq!(messages[1].content, "first");
    }

    #[test]
    fn limit_bounds_the_page() {
        let (db, _dir, match_id) = matched_pair();
        for i in 0..5 {
            db.append_message(&match_id, "alice", &format!("m{i}"))
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let page = db.list_messages(&match_id, 3).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].content, "m4");
    }

    #[test]
    fn non_participant_cannot_post() {
        let (db, _dir, match_id) = matched_pair();
        db.create_agent("carol", "c", vec![], vec![], None, None)
            .unwrap();
        let err = db.append_message(&match_id, "carol", "hi").unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn content_bounds_are_enforced() {
        let (db, _dir, match_id) = matched_pair();
        assert!(matches!(
            db.append_message(&match_id, "alice", ""),
            Err(StoreError::InvalidInput(_))
        ));
        let too_long = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            db.append_message(&match_id, "alice", &too_long),
            Err(StoreError::InvalidInput(_))
        ));
        // Exactly at the bound is fine
        let max = "x".repeat(MAX_CONTENT_CHARS);
        assert!(db.append_message(&match_id, "alice", &max).is_ok());
    }

    #[test]
    fn unknown_match_is_not_found() {
        let (db, _dir, _match_id) = matched_pair();
        assert!(matches!(
            db.append_message("missing", "alice", "hi"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            db.list_messages("missing", 10),
            Err(StoreError::NotFound(_))
        ));
    }
}
