// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Database handle and table definitions.
//!
//! `MatchDb` wraps a single redb [`Database`]; the domain operations are
//! implemented in the sibling modules (`agents`, `keys`, `swipes`,
//! `messages`, `ledger`, `conversion`) as additional `impl MatchDb` blocks
//! so that operations spanning several tables still share one write
//! transaction.

use std::path::Path;

use redb::{Database, TableDefinition};

use super::StoreResult;

// =============================================================================
// Table Definitions
// =============================================================================

/// Profiles: agent name -> serialized AgentProfile (JSON bytes).
pub(crate) const AGENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("agents");

/// Reverse lookup: profile id (the discovery card id) -> agent name.
pub(crate) const AGENT_IDS: TableDefinition<&str, &str> = TableDefinition::new("agent_ids");

/// Credentials: SHA-256 hex digest of the plaintext key -> ApiKeyRecord.
pub(crate) const API_KEYS: TableDefinition<&str, &[u8]> = TableDefinition::new("api_keys");

/// Swipe log: swipe id -> serialized Swipe. Append-only.
pub(crate) const SWIPES: TableDefinition<&str, &[u8]> = TableDefinition::new("swipes");

/// Index: `swiper|card_id|swipe_id` -> direction string.
pub(crate) const SWIPE_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("swipe_index");

/// Matches: match id -> serialized MatchRecord.
pub(crate) const MATCHES: TableDefinition<&str, &[u8]> = TableDefinition::new("matches");

/// Pair guard: `min(a,b)|max(a,b)` -> match id. One match per agent pair.
pub(crate) const MATCH_PAIRS: TableDefinition<&str, &str> = TableDefinition::new("match_pairs");

/// Index: `agent|match_id` -> the other participant's name.
pub(crate) const MATCH_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("match_index");

/// Messages: `match_id|!timestamp_be|msg_id` -> serialized Message.
/// The composite key keeps a per-match range scan in newest-first order.
pub(crate) const MESSAGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("messages");

/// Ledger accounts: agent id -> serialized KcAccount.
pub(crate) const KC_ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("kc_accounts");

/// Ledger audit log: transaction id -> serialized KcTransaction. Append-only.
pub(crate) const KC_TRANSACTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("kc_transactions");

/// Index: `agent|!timestamp_be|tx_id` -> direction ("sent"|"received").
pub(crate) const KC_TX_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("kc_tx_index");

/// Marketplace listings: skill id -> serialized SkillListing.
pub(crate) const KC_SKILLS: TableDefinition<&str, &[u8]> = TableDefinition::new("kc_skills");

/// Registered wallets: agent id -> serialized CryptoWallet.
pub(crate) const CRYPTO_WALLETS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("crypto_wallets");

/// Address uniqueness guard: wallet address -> agent id.
pub(crate) const WALLET_ADDRESSES: TableDefinition<&str, &str> =
    TableDefinition::new("wallet_addresses");

/// Withdrawal requests: withdrawal id -> serialized Withdrawal.
pub(crate) const CRYPTO_WITHDRAWALS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("crypto_withdrawals");

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for a time-ordered index table.
///
/// Format: `scope | inverted_timestamp_be_bytes | id`
///
/// The inverted timestamp ensures newest-first ordering when scanning forward.
pub(crate) fn time_index_key(scope: &str, timestamp_ms: i64, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(scope.len() + 1 + 8 + 1 + id.len());
    key.extend_from_slice(scope.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp_ms as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(id.as_bytes());
    key
}

/// Build a prefix for range scanning all entries within a scope.
pub(crate) fn scope_prefix(scope: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(scope.len() + 1);
    prefix.extend_from_slice(scope.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a prefix range scan.
pub(crate) fn scope_prefix_end(scope: &str) -> Vec<u8> {
    let mut end = scope_prefix(scope);
    // Past any valid key with this prefix
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// Extract the trailing id from a time-ordered composite key.
///
/// The timestamp bytes are opaque (they may contain `|`), so the id is
/// located by offset from the known prefix length rather than by separator.
pub(crate) fn id_from_time_key(key: &[u8], prefix_len: usize) -> Option<String> {
    let id_start = prefix_len + 8 + 1;
    if key.len() <= id_start {
        return None;
    }
    String::from_utf8(key[id_start..].to_vec()).ok()
}

// =============================================================================
// MatchDb
// =============================================================================

/// Embedded ACID store for the whole backend.
pub struct MatchDb {
    pub(crate) db: Database,
}

impl MatchDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(AGENTS)?;
            let _ = write_txn.open_table(AGENT_IDS)?;
            let _ = write_txn.open_table(API_KEYS)?;
            let _ = write_txn.open_table(SWIPES)?;
            let _ = write_txn.open_table(SWIPE_INDEX)?;
            let _ = write_txn.open_table(MATCHES)?;
            let _ = write_txn.open_table(MATCH_PAIRS)?;
            let _ = write_txn.open_table(MATCH_INDEX)?;
            let _ = write_txn.open_table(MESSAGES)?;
            let _ = write_txn.open_table(KC_ACCOUNTS)?;
            let _ = write_txn.open_table(KC_TRANSACTIONS)?;
            let _ = write_txn.open_table(KC_TX_INDEX)?;
            let _ = write_txn.open_table(KC_SKILLS)?;
            let _ = write_txn.open_table(CRYPTO_WALLETS)?;
            let _ = write_txn.open_table(WALLET_ADDRESSES)?;
            let _ = write_txn.open_table(CRYPTO_WITHDRAWALS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        // A read transaction over a pre-created table must succeed
        use redb::ReadableDatabase;
        let read_txn = db.db.begin_read().unwrap();
        let _ = read_txn.open_table(AGENTS).unwrap();
    }

    #[test]
    fn time_index_key_orders_newest_first() {
        let key_old = time_index_key("scope", 1_000, "a");
        let key_new = time_index_key("scope", 2_000, "b");
        assert!(key_new < key_old, "newer timestamps should sort first");
    }

    #[test]
    fn id_recovered_by_offset() {
        let key = time_index_key("match-1", 1_700_000_000_000, "msg-42");
        let prefix = scope_prefix("match-1");
        assert_eq!(
            id_from_time_key(&key, prefix.len()),
            Some("msg-42".to_string())
        );
    }
}
