// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! KC to USDC conversion gateway.
//!
//! A withdrawal debits the agent's KC balance, appends the ledger audit
//! record and inserts the withdrawal request in one write transaction. The
//! on-chain payout happens later; `complete_withdrawal` only flips the
//! status once an operator confirms the transfer.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::db::{
    time_index_key, CRYPTO_WALLETS, CRYPTO_WITHDRAWALS, KC_ACCOUNTS, KC_TRANSACTIONS, KC_TX_INDEX,
    WALLET_ADDRESSES,
};
use super::ledger::{read_account, write_account, KcTransaction, TransactionKind};
use super::{MatchDb, StoreError, StoreResult};

/// Conversion rate: 1 KC = 0.01 USDC.
pub const KC_TO_USDC_RATE: f64 = 0.01;

/// Platform fee taken off the gross USDC amount.
pub const PLATFORM_FEE: f64 = 0.10;

/// Smallest withdrawable amount in KC.
pub const MIN_WITHDRAWAL_KC: i64 = 100;

/// Minimum plausible length for a payout address.
const MIN_ADDRESS_LEN: usize = 30;

/// A registered payout wallet. One per agent; re-registering replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CryptoWallet {
    pub agent_id: String,
    pub wallet_address: String,
    pub network: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Completed,
}

/// A KC to USDC withdrawal request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Withdrawal {
    pub withdrawal_id: String,
    pub agent_id: String,
    pub wallet_address: String,
    pub amount_kc: i64,
    /// Gross USDC before the platform fee
    pub amount_usdc: f64,
    pub fee_usdc: f64,
    /// What actually gets paid out
    pub net_usdc: f64,
    pub status: WithdrawalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Quote for a given KC amount at the fixed rate.
pub fn quote_usdc(amount_kc: i64) -> (f64, f64, f64) {
    let gross = amount_kc as f64 * KC_TO_USDC_RATE;
    let fee = gross * PLATFORM_FEE;
    (gross, fee, gross - fee)
}

impl MatchDb {
    /// Register (or replace) an agent's payout wallet.
    ///
    /// An address may back at most one agent; registering an address that
    /// belongs to someone else fails with `AlreadyExists`.
    pub fn register_wallet(
        &self,
        agent_id: &str,
        wallet_address: &str,
        network: &str,
    ) -> StoreResult<CryptoWallet> {
        if wallet_address.len() < MIN_ADDRESS_LEN {
            return Err(StoreError::InvalidInput(
                "wallet_address too short".to_string(),
            ));
        }

        let wallet = CryptoWallet {
            agent_id: agent_id.to_string(),
            wallet_address: wallet_address.to_string(),
            network: network.to_string(),
            verified: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&wallet)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut addresses = write_txn.open_table(WALLET_ADDRESSES)?;
            if let Some(owner) = addresses.get(wallet_address)? {
                if owner.value() != agent_id {
                    return Err(StoreError::AlreadyExists(format!(
                        "wallet {wallet_address}"
                    )));
                }
            }

            let mut wallets = write_txn.open_table(CRYPTO_WALLETS)?;
            // Drop the reverse entry for a previously registered address
            let previous = wallets.get(agent_id)?.map(|raw| raw.value().to_vec());
            if let Some(raw) = previous {
                let old: CryptoWallet = serde_json::from_slice(&raw)?;
                if old.wallet_address != wallet_address {
                    addresses.remove(old.wallet_address.as_str())?;
                }
            }

            wallets.insert(agent_id, json.as_slice())?;
            addresses.insert(wallet_address, agent_id)?;
        }
        write_txn.commit()?;

        Ok(wallet)
    }

    /// Fetch an agent's registered wallet.
    pub fn get_wallet(&self, agent_id: &str) -> StoreResult<CryptoWallet> {
        let read_txn = self.db.begin_read()?;
        let wallets = read_txn.open_table(CRYPTO_WALLETS)?;
        match wallets.get(agent_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("Wallet for {agent_id}"))),
        }
    }

    /// Request a withdrawal: debit the KC balance, write the audit record
    /// and insert the pending request as one atomic unit.
    pub fn create_withdrawal(&self, agent_id: &str, amount_kc: i64) -> StoreResult<Withdrawal> {
        if amount_kc < MIN_WITHDRAWAL_KC {
            return Err(StoreError::InvalidInput(format!(
                "minimum withdrawal is {MIN_WITHDRAWAL_KC} KC"
            )));
        }

        let now = Utc::now();
        let (gross, fee, net) = quote_usdc(amount_kc);

        let write_txn = self.db.begin_write()?;
        let withdrawal = {
            let wallets = write_txn.open_table(CRYPTO_WALLETS)?;
            let wallet: CryptoWallet = {
                let raw = wallets
                    .get(agent_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Wallet for {agent_id}")))?;
                serde_json::from_slice(raw.value())?
            };

            let mut accounts = write_txn.open_table(KC_ACCOUNTS)?;
            let mut account = read_account(&accounts, agent_id)?;
            if account.balance < amount_kc {
                return Err(StoreError::InsufficientBalance(format!(
                    "balance {} < {amount_kc}",
                    account.balance
                )));
            }
            account.balance -= amount_kc;
            account.total_spent += amount_kc;
            account.updated_at = now;
            write_account(&mut accounts, &account)?;

            let withdrawal = Withdrawal {
                withdrawal_id: Uuid::new_v4().to_string(),
                agent_id: agent_id.to_string(),
                wallet_address: wallet.wallet_address,
                amount_kc,
                amount_usdc: gross,
                fee_usdc: fee,
                net_usdc: net,
                status: WithdrawalStatus::Pending,
                tx_hash: None,
                created_at: now,
                completed_at: None,
            };

            let record = KcTransaction {
                transaction_id: Uuid::new_v4().to_string(),
                from_agent_id: Some(agent_id.to_string()),
                to_agent_id: None,
                amount: amount_kc,
                transaction_type: TransactionKind::Transfer,
                category: Some("crypto_withdrawal".to_string()),
                description: format!("Withdrawal of {amount_kc} KC to USDC"),
                metadata: Some(serde_json::json!({
                    "withdrawal_id": withdrawal.withdrawal_id,
                    "net_usdc": net,
                })),
                created_at: now,
            };
            let tx_json = serde_json::to_vec(&record)?;
            let mut transactions = write_txn.open_table(KC_TRANSACTIONS)?;
            transactions.insert(record.transaction_id.as_str(), tx_json.as_slice())?;

            let mut tx_index = write_txn.open_table(KC_TX_INDEX)?;
            let key = time_index_key(agent_id, now.timestamp_millis(), &record.transaction_id);
            tx_index.insert(key.as_slice(), "sent")?;

            let wd_json = serde_json::to_vec(&withdrawal)?;
            let mut withdrawals = write_txn.open_table(CRYPTO_WITHDRAWALS)?;
            withdrawals.insert(withdrawal.withdrawal_id.as_str(), wd_json.as_slice())?;

            withdrawal
        };
        write_txn.commit()?;

        Ok(withdrawal)
    }

    /// Fetch a withdrawal request by id.
    pub fn get_withdrawal(&self, withdrawal_id: &str) -> StoreResult<Withdrawal> {
        let read_txn = self.db.begin_read()?;
        let withdrawals = read_txn.open_table(CRYPTO_WITHDRAWALS)?;
        match withdrawals.get(withdrawal_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!(
                "Withdrawal {withdrawal_id}"
            ))),
        }
    }

    /// Mark a pending withdrawal as paid out, recording the on-chain hash.
    ///
    /// Idempotent: completing an already-completed withdrawal overwrites the
    /// hash and timestamp but never leaves the `completed` state.
    pub fn complete_withdrawal(
        &self,
        withdrawal_id: &str,
        tx_hash: &str,
    ) -> StoreResult<Withdrawal> {
        let write_txn = self.db.begin_write()?;
        let withdrawal = {
            let mut withdrawals = write_txn.open_table(CRYPTO_WITHDRAWALS)?;
            let mut withdrawal: Withdrawal = {
                let raw = withdrawals
                    .get(withdrawal_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Withdrawal {withdrawal_id}")))?;
                serde_json::from_slice(raw.value())?
            };
            withdrawal.status = WithdrawalStatus::Completed;
            withdrawal.tx_hash = Some(tx_hash.to_string());
            withdrawal.completed_at = Some(Utc::now());

            let json = serde_json::to_vec(&withdrawal)?;
            withdrawals.insert(withdrawal_id, json.as_slice())?;
            withdrawal
        };
        write_txn.commit()?;

        Ok(withdrawal)
    }
}
