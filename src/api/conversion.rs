// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! KC to USDC conversion endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::response::{created, ok, Envelope},
    auth::Auth,
    error::ApiError,
    state::AppState,
    store::conversion::{KC_TO_USDC_RATE, MIN_WITHDRAWAL_KC, PLATFORM_FEE},
    store::{CryptoWallet, Withdrawal},
};

/// Default payout network when the caller does not name one.
const DEFAULT_NETWORK: &str = "polygon";

#[derive(Debug, Serialize, ToSchema)]
pub struct RateResponse {
    pub rate: Rate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Rate {
    #[serde(rename = "kcToUsdcRate")]
    pub kc_to_usdc_rate: f64,
    #[serde(rename = "platformFeePercent")]
    pub platform_fee_percent: f64,
    pub example: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterWalletRequest {
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    pub wallet: CryptoWallet,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    #[serde(rename = "kcAmount")]
    pub kc_amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalResponse {
    pub withdrawal: Withdrawal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteWithdrawalRequest {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/crypto/rate",
    tag = "Conversion",
    responses(
        (status = 200, description = "Fixed conversion rate", body = Envelope<RateResponse>)
    )
)]
pub async fn rate(Auth(_agent): Auth) -> Json<Envelope<RateResponse>> {
    let fee_percent = PLATFORM_FEE * 100.0;
    ok(RateResponse {
        rate: Rate {
            kc_to_usdc_rate: KC_TO_USDC_RATE,
            platform_fee_percent: fee_percent,
            example: format!(
                "1000 KC = ${} USDC (after {fee_percent}% fee)",
                1000.0 * KC_TO_USDC_RATE
            ),
        },
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/crypto/register-wallet",
    request_body = RegisterWalletRequest,
    tag = "Conversion",
    responses(
        (status = 201, description = "Wallet registered", body = Envelope<WalletResponse>),
        (status = 400, description = "Invalid address"),
        (status = 409, description = "Address belongs to another agent")
    )
)]
pub async fn register_wallet(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<RegisterWalletRequest>,
) -> Result<(StatusCode, Json<Envelope<WalletResponse>>), ApiError> {
    let network = request.network.as_deref().unwrap_or(DEFAULT_NETWORK);
    let wallet = state
        .db
        .register_wallet(&agent.agent_id, &request.wallet_address, network)?;
    Ok(created(WalletResponse { wallet }))
}

#[utoipa::path(
    get,
    path = "/api/v1/crypto/wallet",
    tag = "Conversion",
    responses(
        (status = 200, description = "Registered wallet", body = Envelope<WalletResponse>),
        (status = 404, description = "No wallet registered")
    )
)]
pub async fn get_wallet(
    Auth(agent): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<WalletResponse>>, ApiError> {
    let wallet = state
        .db
        .get_wallet(&agent.agent_id)
        .map_err(|e| ApiError::from(e).with_hint("Register a wallet first"))?;
    Ok(ok(WalletResponse { wallet }))
}

#[utoipa::path(
    post,
    path = "/api/v1/crypto/withdraw",
    request_body = WithdrawRequest,
    tag = "Conversion",
    responses(
        (status = 201, description = "Withdrawal created, pending payout", body = Envelope<WithdrawalResponse>),
        (status = 400, description = "Below minimum or insufficient balance"),
        (status = 404, description = "No wallet registered")
    )
)]
pub async fn withdraw(
    Auth(agent): Auth,
    State(state): State<AppState>,
    Json(request): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<Envelope<WithdrawalResponse>>), ApiError> {
    if request.kc_amount < MIN_WITHDRAWAL_KC {
        return Err(ApiError::bad_request(format!(
            "Minimum {MIN_WITHDRAWAL_KC} KC required"
        )));
    }
    let withdrawal = state.db.create_withdrawal(&agent.agent_id, request.kc_amount)?;

    tracing::info!(
        agent = %agent.agent_id,
        withdrawal = %withdrawal.withdrawal_id,
        kc = withdrawal.amount_kc,
        net_usdc = withdrawal.net_usdc,
        "withdrawal requested"
    );

    Ok(created(WithdrawalResponse { withdrawal }))
}

#[utoipa::path(
    get,
    path = "/api/v1/crypto/withdrawal/{withdrawal_id}",
    params(
        ("withdrawal_id" = String, Path, description = "Withdrawal request id")
    ),
    tag = "Conversion",
    responses(
        (status = 200, description = "Withdrawal state", body = Envelope<WithdrawalResponse>),
        (status = 403, description = "Not your withdrawal"),
        (status = 404, description = "Unknown withdrawal")
    )
)]
pub async fn withdrawal_status(
    Auth(agent): Auth,
    Path(withdrawal_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<WithdrawalResponse>>, ApiError> {
    let withdrawal = state.db.get_withdrawal(&withdrawal_id)?;
    if withdrawal.agent_id != agent.agent_id {
        return Err(ApiError::forbidden(
            "You can only view your own withdrawals",
        ));
    }
    Ok(ok(WithdrawalResponse { withdrawal }))
}

#[utoipa::path(
    post,
    path = "/api/v1/crypto/withdrawal/{withdrawal_id}/complete",
    params(
        ("withdrawal_id" = String, Path, description = "Withdrawal request id")
    ),
    request_body = CompleteWithdrawalRequest,
    tag = "Conversion",
    responses(
        (status = 200, description = "Withdrawal marked completed", body = Envelope<WithdrawalResponse>),
        (status = 404, description = "Unknown withdrawal")
    )
)]
pub async fn complete_withdrawal(
    Auth(_agent): Auth,
    Path(withdrawal_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CompleteWithdrawalRequest>,
) -> Result<Json<Envelope<WithdrawalResponse>>, ApiError> {
    let withdrawal = state
        .db
        .complete_withdrawal(&withdrawal_id, &request.tx_hash)?;

    tracing::info!(
        withdrawal = %withdrawal.withdrawal_id,
        tx_hash = %request.tx_hash,
        "withdrawal completed"
    );

    Ok(ok(WithdrawalResponse { withdrawal }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedAgent;
    use crate::store::{MatchDb, WithdrawalStatus};

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        (AppState::new(db), dir)
    }

    fn as_agent(name: &str) -> Auth {
        Auth(AuthenticatedAgent {
            agent_id: name.to_string(),
            legacy: false,
        })
    }

    #[tokio::test]
    async fn rate_quotes_the_fixed_numbers() {
        let Json(envelope) = rate(as_agent("alice")).await;
        assert!((envelope.data.rate.kc_to_usdc_rate - 0.01).abs() < 1e-9);
        assert!((envelope.data.rate.platform_fee_percent - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn withdrawal_flow_end_to_end() {
        let (state, _dir) = test_state();
        state.db.create_kc_account("alice", "alice").unwrap();
        state.db.earn_kc("alice", 900, "task", "seed").unwrap();

        let (status, Json(envelope)) = register_wallet(
            as_agent("alice"),
            State(state.clone()),
            Json(RegisterWalletRequest {
                wallet_address: ADDR.to_string(),
                network: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.data.wallet.network, "polygon");

        let (_, Json(envelope)) = withdraw(
            as_agent("alice"),
            State(state.clone()),
            Json(WithdrawRequest { kc_amount: 1000 }),
        )
        .await
        .unwrap();
        let withdrawal = envelope.data.withdrawal;
        assert!((withdrawal.amount_usdc - 10.0).abs() < 1e-9);
        assert!((withdrawal.fee_usdc - 1.0).abs() < 1e-9);
        assert!((withdrawal.net_usdc - 9.0).abs() < 1e-9);

        let Json(envelope) = complete_withdrawal(
            as_agent("admin"),
            Path(withdrawal.withdrawal_id.clone()),
            State(state.clone()),
            Json(CompleteWithdrawalRequest {
                tx_hash: "0xabc".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.withdrawal.status, WithdrawalStatus::Completed);

        let Json(envelope) = withdrawal_status(
            as_agent("alice"),
            Path(withdrawal.withdrawal_id),
            State(state),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.withdrawal.tx_hash.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn below_minimum_is_rejected_before_the_store() {
        let (state, _dir) = test_state();
        let err = withdraw(
            as_agent("alice"),
            State(state),
            Json(WithdrawRequest { kc_amount: 99 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn withdrawal_status_is_owner_only() {
        let (state, _dir) = test_state();
        state.db.create_kc_account("alice", "alice").unwrap();
        state.db.earn_kc("alice", 900, "task", "seed").unwrap();
        state.db.register_wallet("alice", ADDR, "polygon").unwrap();
        let withdrawal = state.db.create_withdrawal("alice", 100).unwrap();

        let err = withdrawal_status(
            as_agent("mallory"),
            Path(withdrawal.withdrawal_id),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
