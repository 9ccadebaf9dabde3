// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Credential shapes and key material.

use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use super::error::AuthError;
use crate::store::MatchDb;

/// Length of an issued key and of its stored hex digest.
pub const DIGEST_KEY_LEN: usize = 64;

/// Last day legacy `<name>_key` credentials are accepted.
pub const MIGRATION_DEADLINE: &str = "2026-02-13";

/// A parsed bearer credential.
///
/// `Legacy` is a deliberate, time-boxed relaxation: the shape alone
/// authenticates, with no lookup against the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Store-backed key; holds the plaintext as presented
    Digest(String),
    /// Pre-migration `<name>_key` credential
    Legacy { agent_name: String },
}

impl Credential {
    /// Classify a bearer token by shape.
    pub fn parse(raw: &str) -> Credential {
        if raw.ends_with("_key") && raw.len() < DIGEST_KEY_LEN {
            let agent_name = raw.split('_').next().unwrap_or_default().to_string();
            Credential::Legacy { agent_name }
        } else {
            Credential::Digest(raw.to_string())
        }
    }

    /// Resolve the credential to an agent identity.
    pub fn resolve(&self, db: &MatchDb) -> Result<super::AuthenticatedAgent, AuthError> {
        match self {
            Credential::Legacy { agent_name } => {
                tracing::warn!(
                    agent = %agent_name,
                    deadline = MIGRATION_DEADLINE,
                    "legacy API key used; migrate to issued keys"
                );
                Ok(super::AuthenticatedAgent {
                    agent_id: agent_name.clone(),
                    legacy: true,
                })
            }
            Credential::Digest(plaintext) => {
                let digest = hash_key(plaintext);
                let agent_id = db
                    .validate_api_key(&digest)
                    .map_err(|e| match e {
                        crate::store::StoreError::NotFound(_) => AuthError::InvalidKey,
                        other => AuthError::Internal(other.to_string()),
                    })?;
                Ok(super::AuthenticatedAgent {
                    agent_id,
                    legacy: false,
                })
            }
        }
    }
}

/// Generate a fresh 64-character hex API key.
pub fn generate_key() -> Result<String, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes)
        .map_err(|_| AuthError::Internal("key generation failed".to_string()))?;
    Ok(hex::encode(bytes))
}

/// One-way digest of a plaintext key (SHA-256, hex).
pub fn hash_key(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
