// SPDX-License-Identifier: AGPL-3.0-or-later

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{PublicUser, Transaction},
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod config;
pub mod health;
pub mod paypal;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/config", get(config::public_config))
        .route("/auth/register", post(auth::register))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/resend", post(auth::resend))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/coins/balance", get(wallet::balance))
        .route("/coins/transactions", get(wallet::transactions))
        .route("/coins/update", post(admin::set_balance))
        .route("/admin/users/find", post(admin::find_user))
        .route("/paypal/create-order", post(paypal::create_order))
        .route("/paypal/capture-order", post(paypal::capture_order))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        config::public_config,
        auth::register,
        auth::verify,
        auth::resend,
        auth::login,
        auth::google,
        auth::logout,
        auth::me,
        wallet::balance,
        wallet::transactions,
        admin::set_balance,
        admin::find_user,
        paypal::create_order,
        paypal::capture_order
    ),
    components(
        schemas(
            PublicUser,
            Transaction,
            health::HealthResponse,
            health::HealthChecks,
            config::PublicConfig,
            auth::RegisterRequest,
            auth::VerifyRequest,
            auth::ResendRequest,
            auth::LoginRequest,
            auth::GoogleLoginRequest,
            auth::UserResponse,
            auth::SessionResponse,
            auth::MessageResponse,
            wallet::BalanceResponse,
            wallet::TransactionsResponse,
            admin::SetBalanceRequest,
            admin::SetBalanceResponse,
            admin::FindUserRequest,
            admin::FindUserResponse,
            paypal::CreateOrderRequest,
            paypal::CreateOrderResponse,
            paypal::CaptureOrderRequest,
            paypal::CaptureOrderResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Config", description = "Public configuration"),
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Wallet", description = "Player wallet"),
        (name = "Admin", description = "Administrative operations"),
        (name = "Payments", description = "PayPal checkout")
    )
)]
struct ApiDoc;
