// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! Kai Credits endpoints.
//!
//! Every operation that reads or spends an account is pinned to the
//! authenticated agent: you can only inspect your own balance and history,
//! transfer from your own account, earn into it, and purchase as yourself.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::response::{created, ok, Envelope},
    auth::Auth,
    error::ApiError,
    state::AppState,
    store::ledger::{
        DirectedTransaction, KcTransaction, PurchaseReceipt, SkillListing, DEFAULT_TX_LIMIT,
    },
    store::KcAccount,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Display name; defaults to the authenticated agent name
    #[serde(default, rename = "agentName")]
    pub agent_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub account: KcAccount,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EarnRequest {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub amount: i64,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction: KcTransaction,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionsResponse {
    pub transactions: Vec<DirectedTransaction>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SkillsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SkillsResponse {
    pub skills: Vec<SkillListing>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSkillRequest {
    pub skill_name: String,
    #[serde(default)]
    pub description: String,
    pub price_kc: i64,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SkillResponse {
    pub skill: SkillListing,
}

#[utoipa::path(
    post,
    path = "/api/kc/account",
    request_body = CreateAccountRequest,
    tag = "Credits",
    responses(
        (status = 201, description = "Account created with the initial grant", body = Envelope<AccountResponse>),
        (status = 409, description = "Account already exists")
    )
)]
pub async fn create_account(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Envelope<AccountResponse>>), ApiError> {
    let name = request.agent_name.unwrap_or_else(|| agent.agent_id.clone());
    let account = state.db.create_kc_account(&agent.agent_id, &name)?;
    Ok(created(AccountResponse { account }))
}

#[utoipa::path(
    get,
    path = "/api/kc/balance/{agent_id}",
    params(
        ("agent_id" = String, Path, description = "Account owner; must be the caller")
    ),
    tag = "Credits",
    responses(
        (status = 200, description = "Account state", body = Envelope<AccountResponse>),
        (status = 403, description = "Not your account"),
        (status = 404, description = "No account")
    )
)]
pub async fn balance(
    Auth(agent): Auth,
    Path(agent_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<AccountResponse>>, ApiError> {
    if agent_id != agent.agent_id {
        return Err(ApiError::forbidden("You can only view your own balance"));
    }
    let account = state.db.get_kc_account(&agent_id)?;
    Ok(ok(AccountResponse { account }))
}

#[utoipa::path(
    post,
    path = "/api/kc/transfer",
    request_body = TransferRequest,
    tag = "Credits",
    responses(
        (status = 200, description = "Transfer applied", body = Envelope<TransactionResponse>),
        (status = 400, description = "Insufficient balance or invalid amount"),
        (status = 403, description = "Sender is not the caller")
    )
)]
pub async fn transfer(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<Envelope<TransactionResponse>>, ApiError> {
    if request.from != agent.agent_id {
        return Err(ApiError::forbidden(
            "You can only transfer from your own account",
        ));
    }
    let transaction = state.db.transfer_kc(
        &request.from,
        &request.to,
        request.amount,
        &request.description,
    )?;
    Ok(ok(TransactionResponse { transaction }))
}

#[utoipa::path(
    post,
    path = "/api/kc/earn",
    request_body = EarnRequest,
    tag = "Credits",
    responses(
        (status = 200, description = "Credits minted", body = Envelope<TransactionResponse>),
        (status = 403, description = "Recipient is not the caller")
    )
)]
pub async fn earn(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<EarnRequest>,
) -> Result<Json<Envelope<TransactionResponse>>, ApiError> {
    if request.agent_id != agent.agent_id {
        return Err(ApiError::forbidden(
            "You can only earn into your own account",
        ));
    }
    let transaction = state.db.earn_kc(
        &request.agent_id,
        request.amount,
        &request.category,
        &request.description,
    )?;
    Ok(ok(TransactionResponse { transaction }))
}

#[utoipa::path(
    get,
    path = "/api/kc/transactions/{agent_id}",
    params(
        ("agent_id" = String, Path, description = "Account owner; must be the caller"),
        TransactionsQuery
    ),
    tag = "Credits",
    responses(
        (status = 200, description = "History, newest first", body = Envelope<TransactionsResponse>),
        (status = 403, description = "Not your history")
    )
)]
pub async fn transactions(
    Auth(agent): Auth,
    Path(agent_id): Path<String>,
    Query(query): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<TransactionsResponse>>, ApiError> {
    if agent_id != agent.agent_id {
        return Err(ApiError::forbidden(
            "You can only view your own transactions",
        ));
    }
    let limit = query.limit.unwrap_or(DEFAULT_TX_LIMIT);
    let transactions = state.db.kc_transactions(&agent_id, limit)?;
    Ok(ok(TransactionsResponse { transactions }))
}

#[utoipa::path(
    get,
    path = "/api/kc/marketplace/skills",
    params(SkillsQuery),
    tag = "Credits",
    responses(
        (status = 200, description = "Listings, most downloaded first", body = Envelope<SkillsResponse>)
    )
)]
pub async fn list_skills(
    Auth(_agent): Auth,
    Query(query): Query<SkillsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<SkillsResponse>>, ApiError> {
    let skills = state.db.list_skills(query.category.as_deref())?;
    Ok(ok(SkillsResponse { skills }))
}

#[utoipa::path(
    post,
    path = "/api/kc/marketplace/skills",
    request_body = CreateSkillRequest,
    tag = "Credits",
    responses(
        (status = 201, description = "Listing created", body = Envelope<SkillResponse>)
    )
)]
pub async fn create_skill(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Envelope<SkillResponse>>), ApiError> {
    let skill = state.db.create_skill_listing(
        &agent.agent_id,
        &request.skill_name,
        &request.description,
        request.price_kc,
        request.category,
    )?;
    Ok(created(SkillResponse { skill }))
}

#[utoipa::path(
    post,
    path = "/api/kc/marketplace/skills/{skill_id}/purchase",
    params(
        ("skill_id" = String, Path, description = "Listing to purchase")
    ),
    tag = "Credits",
    responses(
        (status = 200, description = "Purchased", body = Envelope<PurchaseReceipt>),
        (status = 400, description = "Insufficient balance"),
        (status = 404, description = "Unknown listing")
    )
)]
pub async fn purchase_skill(
    Auth(agent): Auth,
    Path(skill_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<PurchaseReceipt>>, ApiError> {
    let receipt = state.db.purchase_skill(&skill_id, &agent.agent_id)?;
    Ok(ok(receipt))
}
