// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! # Authentication Module
//!
//! Every endpoint except registration, profile creation and the health
//! probes requires `Authorization: Bearer <key>`. Two credential shapes are
//! accepted behind the one gate:
//!
//! - **Digest key**: a 64-character hex key issued by
//!   `POST /api/v1/auth/register`. Only its SHA-256 digest is stored; a key
//!   is valid until its 30-day expiry and refreshes `last_used` on each use.
//! - **Legacy key**: `<name>_key`, shorter than a digest. Accepted verbatim
//!   during the migration window with NO cryptographic validation - any
//!   string of that shape authenticates as `<name>`. Each use is logged and
//!   the response carries deprecation headers.
//!
//! The two shapes are modeled as an explicit [`Credential`] enum rather
//! than string sniffing scattered through handlers.

pub mod credentials;
pub mod error;
pub mod extractor;
pub mod middleware;

pub use credentials::{Credential, MIGRATION_DEADLINE};
pub use error::AuthError;
pub use extractor::{Auth, AuthenticatedAgent};
pub use middleware::auth_middleware;
