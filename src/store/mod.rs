// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! # Embedded Store Module
//!
//! All persistent state lives in a single redb database (pure Rust, ACID).
//! Each logical mutation executes inside one write transaction, so the
//! multi-statement sequences that matter (balance debit + record insert,
//! swipe insert + mutual check + match insert, withdrawal debit + insert)
//! either commit as a unit or leave no trace.
//!
//! ## Table Layout
//!
//! ```text
//! agents              name -> AgentProfile (JSON)
//! agent_ids           profile id -> name
//! api_keys            key_hash -> ApiKeyRecord (JSON)
//! swipes              swipe id -> Swipe (JSON)
//! swipe_index         swiper|card_id|swipe_id -> direction
//! matches             match id -> MatchRecord (JSON)
//! match_pairs         min(a,b)|max(a,b) -> match id
//! match_index         agent|match_id -> other agent
//! messages            match_id|!ts_be|msg_id -> Message (JSON)
//! kc_accounts         agent id -> KcAccount (JSON)
//! kc_transactions     transaction id -> KcTransaction (JSON)
//! kc_tx_index         agent|!ts_be|tx_id -> "sent"|"received"
//! kc_skills           skill id -> SkillListing (JSON)
//! crypto_wallets      agent id -> CryptoWallet (JSON)
//! wallet_addresses    address -> agent id
//! crypto_withdrawals  withdrawal id -> Withdrawal (JSON)
//! ```
//!
//! Time-ordered index keys embed an inverted big-endian timestamp so a
//! forward range scan yields newest-first ordering.

pub mod agents;
pub mod conversion;
pub mod db;
pub mod keys;
pub mod ledger;
pub mod messages;
pub mod swipes;

pub use agents::{AgentProfile, ProfilePatch};
pub use conversion::{CryptoWallet, Withdrawal, WithdrawalStatus};
pub use db::MatchDb;
pub use keys::ApiKeyRecord;
pub use ledger::{KcAccount, KcTransaction, SkillListing, TransactionKind};
pub use messages::Message;
pub use swipes::{MatchRecord, MatchStatus, SwipeDirection, SwipeOutcome};

/// Store error type.
///
/// The redb variants mirror the crate's split error hierarchy; domain
/// variants carry the entity that failed the check.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
