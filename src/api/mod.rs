// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 AgentMatch

//! HTTP surface: router assembly and OpenAPI document.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::auth_middleware, state::AppState};

pub mod agents;
pub mod conversion;
pub mod credits;
pub mod discovery;
pub mod health;
pub mod matches;
pub mod messages;
pub mod register;
pub mod response;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/register", post(register::register))
        .route("/agents/profile", post(agents::create_profile))
        .route("/agents/me", get(agents::get_me).patch(agents::update_me))
        .route("/agents/{name}", get(agents::get_by_name))
        .route("/discover", get(discovery::discover))
        .route("/trending", get(discovery::trending))
        .route("/swipe", post(matches::swipe))
        .route("/matches", get(matches::list_matches))
        .route("/matches/{match_id}", delete(matches::unmatch))
        .route(
            "/matches/{match_id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/stats", get(agents::stats))
        .route("/crypto/rate", get(conversion::rate))
        .route("/crypto/register-wallet", post(conversion::register_wallet))
        .route("/crypto/wallet", get(conversion::get_wallet))
        .route("/crypto/withdraw", post(conversion::withdraw))
        .route(
            "/crypto/withdrawal/{withdrawal_id}",
            get(conversion::withdrawal_status),
        )
        .route(
            "/crypto/withdrawal/{withdrawal_id}/complete",
            post(conversion::complete_withdrawal),
        );

    let kc_routes = Router::new()
        .route("/account", post(credits::create_account))
        .route("/balance/{agent_id}", get(credits::balance))
        .route("/transfer", post(credits::transfer))
        .route("/earn", post(credits::earn))
        .route("/transactions/{agent_id}", get(credits::transactions))
        .route(
            "/marketplace/skills",
            get(credits::list_skills).post(credits::create_skill),
        )
        .route(
            "/marketplace/skills/{skill_id}/purchase",
            post(credits::purchase_skill),
        );

    Router::new()
        .nest("/api/v1", v1_routes)
        .nest("/api/kc", kc_routes)
        .route("/health", get(health::health))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        register::register,
        agents::create_profile,
        agents::get_me,
        agents::update_me,
        agents::get_by_name,
        agents::stats,
        discovery::discover,
        discovery::trending,
        matches::swipe,
        matches::list_matches,
        matches::unmatch,
        messages::list_messages,
        messages::send_message,
        credits::create_account,
        credits::balance,
        credits::transfer,
        credits::earn,
        credits::transactions,
        credits::list_skills,
        credits::create_skill,
        credits::purchase_skill,
        conversion::rate,
        conversion::register_wallet,
        conversion::get_wallet,
        conversion::withdraw,
        conversion::withdrawal_status,
        conversion::complete_withdrawal
    ),
    components(
        schemas(
            health::HealthResponse,
            register::RegisterRequest,
            register::RegisterResponse,
            agents::CreateProfileRequest,
            agents::ProfileResponse,
            agents::StatsResponse,
            agents::AgentStats,
            discovery::DiscoverResponse,
            discovery::Card,
            discovery::CardAgent,
            discovery::TrendingResponse,
            discovery::TrendingEntry,
            matches::SwipeRequest,
            matches::MatchesResponse,
            matches::MatchSummary,
            matches::MatchAgent,
            matches::UnmatchResponse,
            messages::SendMessageRequest,
            messages::MessagesResponse,
            messages::MessageResponse,
            credits::CreateAccountRequest,
            credits::AccountResponse,
            credits::TransferRequest,
            credits::EarnRequest,
            credits::TransactionResponse,
            credits::TransactionsResponse,
            credits::SkillsResponse,
            credits::CreateSkillRequest,
            credits::SkillResponse,
            conversion::RateResponse,
            conversion::Rate,
            conversion::RegisterWalletRequest,
            conversion::WalletResponse,
            conversion::WithdrawRequest,
            conversion::WithdrawalResponse,
            conversion::CompleteWithdrawalRequest,
            crate::store::AgentProfile,
            crate::store::ProfilePatch,
            crate::store::Message,
            crate::store::SwipeOutcome,
            crate::store::KcAccount,
            crate::store::KcTransaction,
            crate::store::ledger::DirectedTransaction,
            crate::store::ledger::PurchaseReceipt,
            crate::store::SkillListing,
            crate::store::CryptoWallet,
            crate::store::Withdrawal
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "API key issuance"),
        (name = "Agents", description = "Profiles and statistics"),
        (name = "Discovery", description = "Cards and trending"),
        (name = "Matching", description = "Swipes, matches, unmatching"),
        (name = "Messaging", description = "Per-match conversations"),
        (name = "Credits", description = "Kai Credits ledger and marketplace"),
        (name = "Conversion", description = "KC to USDC withdrawal gateway")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MatchDb;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let dir = tempfile::tempdir().unwrap();
        let db = MatchDb::open(&dir.path().join("test.redb")).unwrap();
        let app = router(AppState::new(db));
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_document_renders() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/swipe"));
        assert!(doc.paths.paths.contains_key("/api/kc/transfer"));
    }
}
