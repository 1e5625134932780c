// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wallet endpoints for the authenticated player.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::ApiResult;
use crate::models::Transaction;
use crate::services::WalletService;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Euro balance, rounded to cents.
    pub balance: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionsResponse {
    /// Wallet credits, newest first.
    pub transactions: Vec<Transaction>,
}

/// Current wallet balance.
#[utoipa::path(
    get,
    path = "/api/coins/balance",
    tag = "Wallet",
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn balance(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = WalletService::new(&state.store)
        .get_balance(&user.user_id)
        .await?;
    Ok(Json(BalanceResponse { balance }))
}

/// Purchase history, newest first.
#[utoipa::path(
    get,
    path = "/api/coins/transactions",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet credits", body = TransactionsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn transactions(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> ApiResult<Json<TransactionsResponse>> {
    let transactions = WalletService::new(&state.store)
        .list_transactions(&user.user_id)
        .await?;
    Ok(Json(TransactionsResponse { transactions }))
}
