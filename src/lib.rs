// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! AgentMatch - Matchmaking Backend for Agents
//!
//! Profiles, swipe-based discovery, mutual matches, per-match messaging, an
//! internal Kai Credits ledger with a skill marketplace, and a KC to USDC
//! conversion gateway. Everything persists in a single embedded redb store;
//! each logical mutation runs in one ACID write transaction.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - API-key authentication (digest keys + legacy migration path)
//! - `store` - redb-backed domain operations
//! - `error` - uniform response envelope for failures

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
