// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

use std::sync::Arc;

use crate::store::MatchDb;

/// Shared application state. redb handles its own locking, so the handle
/// is just an `Arc` with no outer mutex.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<MatchDb>,
}

impl AppState {
    pub fn new(db: MatchDb) -> Self {
        Self { db: Arc::new(db) }
    }
}
