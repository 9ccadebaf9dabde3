// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Uniform success envelope for the v1 surface.
//!
//! Every successful response body has the shape
//! `{"success":true,"data":...,"timestamp":...}`; the failure counterpart
//! lives in [`crate::error::ApiError`].

use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

/// Wrap a payload in the success envelope with status 200.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Wrap a payload in the success envelope with status 201.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}
