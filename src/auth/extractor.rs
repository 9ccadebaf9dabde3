// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Axum extractor for authenticated agents.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(agent): Auth) -> impl IntoResponse {
//!     // agent is AuthenticatedAgent
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::credentials::Credential;
use super::AuthError;
use crate::state::AppState;

/// The identity a request acts as.
#[derive(Debug, Clone)]
pub struct AuthenticatedAgent {
    /// Agent name; every row in the store is keyed by it
    pub agent_id: String,
    /// True when the request authenticated with a `<name>_key` credential
    pub legacy: bool,
}

/// Extractor for authenticated agents.
///
/// The auth middleware normally resolves the credential and stashes the
/// agent in request extensions; the extractor picks that up. Routes mounted
/// outside the middleware still work, as the extractor falls back to
/// resolving the Authorization header itself.
pub struct Auth(pub AuthenticatedAgent);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the agent
        if let Some(agent) = parts.extensions.get::<AuthenticatedAgent>().cloned() {
            return Ok(Auth(agent));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::InvalidAuthHeader);
        }

        let agent = Credential::parse(token).resolve(&state.db)?;
        Ok(Auth(agent))
    }
}
