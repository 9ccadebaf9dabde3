// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Kai Credits ledger.
//!
//! Balances are adjusted only through transfer, earn and purchase; no
//! operation ever sets a balance to an absolute value. Every balance
//! mutation and its audit record commit in one write transaction, so a
//! fault mid-sequence leaves the ledger untouched. Transfers against an
//! insufficient balance abort before any write.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, Table};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::db::{
    id_from_time_key, scope_prefix, scope_prefix_end, time_index_key, KC_ACCOUNTS, KC_SKILLS,
    KC_TRANSACTIONS, KC_TX_INDEX,
};
use super::{MatchDb, StoreError, StoreResult};

/// Balance granted to every newly created account.
pub const INITIAL_GRANT: i64 = 100;

/// Default page size for transaction history.
pub const DEFAULT_TX_LIMIT: usize = 50;

/// A KC account. One per agent, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KcAccount {
    pub agent_id: String,
    pub agent_name: String,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub reputation_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Transfer,
    Earn,
}

/// Immutable ledger audit record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KcTransaction {
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_agent_id: Option<String>,
    pub amount: i64,
    pub transaction_type: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A transaction paired with its direction relative to the queried agent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DirectedTransaction {
    #[serde(flatten)]
    pub transaction: KcTransaction,
    /// "sent" or "received"
    pub direction: String,
}

/// A marketplace skill listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkillListing {
    pub skill_id: String,
    pub seller_agent_id: String,
    pub skill_name: String,
    pub description: String,
    pub price_kc: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub downloads: i64,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

/// Result of a marketplace purchase.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseReceipt {
    pub skill: SkillListing,
    pub transaction_id: String,
}

pub(super) fn read_account(
    accounts: &Table<'_, &'static str, &'static [u8]>,
    agent_id: &str,
) -> StoreResult<KcAccount> {
    let raw = accounts
        .get(agent_id)?
        .ok_or_else(|| StoreError::NotFound(format!("KC account {agent_id}")))?;
    Ok(serde_json::from_slice(raw.value())?)
}

pub(super) fn write_account(
    accounts: &mut Table<'_, &'static str, &'static [u8]>,
    account: &KcAccount,
) -> StoreResult<()> {
    let json = serde_json::to_vec(account)?;
    // insert borrows the key from the account, so build it first
    let key = account.agent_id.clone();
    accounts.insert(key.as_str(), json.as_slice())?;
    Ok(())
}

/// Move `amount` from one account to the other and append the audit record,
/// all against tables owned by the caller's write transaction.
#[allow(clippy::too_many_arguments)]
fn transfer_within(
    accounts: &mut Table<'_, &'static str, &'static [u8]>,
    transactions: &mut Table<'_, &'static str, &'static [u8]>,
    tx_index: &mut Table<'_, &'static [u8], &'static str>,
    from: &str,
    to: &str,
    amount: i64,
    description: &str,
) -> StoreResult<KcTransaction> {
    if amount <= 0 {
        return Err(StoreError::InvalidInput(
            "amount must be positive".to_string(),
        ));
    }
    // A self-transfer would write the same account row twice and the second
    // write would undo the debit, crediting the amount from nothing.
    if from == to {
        return Err(StoreError::InvalidInput(
            "sender and recipient must differ".to_string(),
        ));
    }

    let now = Utc::now();

    let mut from_account = read_account(accounts, from)?;
    if from_account.balance < amount {
        return Err(StoreError::InsufficientBalance(format!(
            "balance {} < {amount}",
            from_account.balance
        )));
    }
    let mut to_account = read_account(accounts, to)?;

    from_account.balance -= amount;
    from_account.total_spent += amount;
    from_account.updated_at = now;
    to_account.balance += amount;
    to_account.total_earned += amount;
    to_account.updated_at = now;

    write_account(accounts, &from_account)?;
    write_account(accounts, &to_account)?;

    let record = KcTransaction {
        transaction_id: Uuid::new_v4().to_string(),
        from_agent_id: Some(from.to_string()),
        to_agent_id: Some(to.to_string()),
        amount,
        transaction_type: TransactionKind::Transfer,
        category: None,
        description: description.to_string(),
        metadata: None,
        created_at: now,
    };
    let json = serde_json::to_vec(&record)?;
    transactions.insert(record.transaction_id.as_str(), json.as_slice())?;

    let ts = now.timestamp_millis();
    let from_key = time_index_key(from, ts, &record.transaction_id);
    let to_key = time_index_key(to, ts, &record.transaction_id);
    tx_index.insert(from_key.as_slice(), "sent")?;
    tx_index.insert(to_key.as_slice(), "received")?;

    Ok(record)
}

impl MatchDb {
    /// Create a KC account with the initial grant.
    ///
    /// Fails with `AlreadyExists` if the agent already has one.
    pub fn create_kc_account(&self, agent_id: &str, agent_name: &str) -> StoreResult<KcAccount> {
        let now = Utc::now();
        let account = KcAccount {
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            balance: INITIAL_GRANT,
            total_earned: 0,
            total_spent: 0,
            reputation_score: 0,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_vec(&account)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(KC_ACCOUNTS)?;
            if accounts.get(agent_id)?.is_some() {
                return Err(StoreError::AlreadyExists(format!("KC account {agent_id}")));
            }
            accounts.insert(agent_id, json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(account)
    }

    /// Fetch an account by agent id.
    pub fn get_kc_account(&self, agent_id: &str) -> StoreResult<KcAccount> {
        let read_txn = self.db.begin_read()?;
        let accounts = read_txn.open_table(KC_ACCOUNTS)?;
        match accounts.get(agent_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("KC account {agent_id}"))),
        }
    }

    /// Transfer KC between two accounts.
    pub fn transfer_kc(
        &self,
        from: &str,
        to: &str,
        amount: i64,
        description: &str,
    ) -> StoreResult<KcTransaction> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut accounts = write_txn.open_table(KC_ACCOUNTS)?;
            let mut transactions = write_txn.open_table(KC_TRANSACTIONS)?;
            let mut tx_index = write_txn.open_table(KC_TX_INDEX)?;
            transfer_within(
                &mut accounts,
                &mut transactions,
                &mut tx_index,
                from,
                to,
                amount,
                description,
            )?
        };
        write_txn.commit()?;

        Ok(record)
    }

    /// Credit freshly minted KC to an account (system reward).
    pub fn earn_kc(
        &self,
        agent_id: &str,
        amount: i64,
        category: &str,
        description: &str,
    ) -> StoreResult<KcTransaction> {
        if amount <= 0 {
            return Err(StoreError::InvalidInput(
                "amount must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut accounts = write_txn.open_table(KC_ACCOUNTS)?;
            let mut account = read_account(&accounts, agent_id)?;
            account.balance += amount;
            account.total_earned += amount;
            account.updated_at = now;
            write_account(&mut accounts, &account)?;

            let record = KcTransaction {
                transaction_id: Uuid::new_v4().to_string(),
                from_agent_id: None,
                to_agent_id: Some(agent_id.to_string()),
                amount,
                transaction_type: TransactionKind::Earn,
                category: Some(category.to_string()),
                description: description.to_string(),
                metadata: None,
                created_at: now,
            };
            let json = serde_json::to_vec(&record)?;
            let mut transactions = write_txn.open_table(KC_TRANSACTIONS)?;
            transactions.insert(record.transaction_id.as_str(), json.as_slice())?;

            let mut tx_index = write_txn.open_table(KC_TX_INDEX)?;
            let key = time_index_key(agent_id, now.timestamp_millis(), &record.transaction_id);
            tx_index.insert(key.as_slice(), "received")?;
            record
        };
        write_txn.commit()?;

        Ok(record)
    }

    /// An agent's transaction history, newest first, bounded by `limit`.
    pub fn kc_transactions(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<DirectedTransaction>> {
        let read_txn = self.db.begin_read()?;
        let tx_index = read_txn.open_table(KC_TX_INDEX)?;
        let transactions = read_txn.open_table(KC_TRANSACTIONS)?;

        let start = scope_prefix(agent_id);
        let end = scope_prefix_end(agent_id);

        let mut result = Vec::new();
        for entry in tx_index.range(start.as_slice()..end.as_slice())? {
            let entry = entry?;
            let key = entry.0.value().to_vec();
            let direction = entry.1.value().to_string();
            let Some(tx_id) = id_from_time_key(&key, start.len()) else {
                continue;
            };
            if let Some(raw) = transactions.get(tx_id.as_str())? {
                let transaction: KcTransaction = serde_json::from_slice(raw.value())?;
                result.push(DirectedTransaction {
                    transaction,
                    direction,
                });
            }
            if result.len() >= limit {
                break;
            }
        }

        Ok(result)
    }

    /// Create a marketplace listing.
    pub fn create_skill_listing(
        &self,
        seller: &str,
        skill_name: &str,
        description: &str,
        price_kc: i64,
        category: Option<String>,
    ) -> StoreResult<SkillListing> {
        if price_kc <= 0 {
            return Err(StoreError::InvalidInput(
                "price_kc must be positive".to_string(),
            ));
        }

        let listing = SkillListing {
            skill_id: Uuid::new_v4().to_string(),
            seller_agent_id: seller.to_string(),
            skill_name: skill_name.to_string(),
            description: description.to_string(),
            price_kc,
            category,
            downloads: 0,
            rating: 0.0,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&listing)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut skills = write_txn.open_table(KC_SKILLS)?;
            skills.insert(listing.skill_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(listing)
    }

    /// List marketplace skills ordered by downloads descending, optionally
    /// filtered by category.
    pub fn list_skills(&self, category: Option<&str>) -> StoreResult<Vec<SkillListing>> {
        let read_txn = self.db.begin_read()?;
        let skills = read_txn.open_table(KC_SKILLS)?;

        let mut result = Vec::new();
        for entry in skills.iter()? {
            let entry = entry?;
            let listing: SkillListing = serde_json::from_slice(entry.1.value())?;
            if let Some(wanted) = category {
                if listing.category.as_deref() != Some(wanted) {
                    continue;
                }
            }
            result.push(listing);
        }
        result.sort_by(|a, b| b.downloads.cmp(&a.downloads));

        Ok(result)
    }

    /// Purchase a skill: pay the seller and bump the download counter, as
    /// one atomic unit.
    pub fn purchase_skill(&self, skill_id: &str, buyer: &str) -> StoreResult<PurchaseReceipt> {
        let write_txn = self.db.begin_write()?;
        let receipt = {
            let mut skills = write_txn.open_table(KC_SKILLS)?;
            let mut listing: SkillListing = {
                let raw = skills
                    .get(skill_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Skill {skill_id}")))?;
                serde_json::from_slice(raw.value())?
            };

            let mut accounts = write_txn.open_table(KC_ACCOUNTS)?;
            let mut transactions = write_txn.open_table(KC_TRANSACTIONS)?;
            let mut tx_index = write_txn.open_table(KC_TX_INDEX)?;
            let record = transfer_within(
                &mut accounts,
                &mut transactions,
                &mut tx_index,
                buyer,
                &listing.seller_agent_id,
                listing.price_kc,
                &format!("Purchased skill: {}", listing.skill_name),
            )?;

            listing.downloads += 1;
            let json = serde_json::to_vec(&listing)?;
            skills.insert(skill_id, json.as_slice())?;

            PurchaseReceipt {
                skill: listing,
                transaction_id: record.transaction_id,
            }
        };
        write_txn.commit()?;

        Ok(receipt)
    }
}
