// SPDX-License-Identifier: AGPL-3.0-or-later

//! Checkout endpoints. Both routes 503 when PayPal is not configured.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::ApiResult;
use crate::models::Transaction;
use crate::services::PaymentService;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Wallet euros to buy.
    pub euros: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub status: String,
    /// Buyer approval URL, when PayPal returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrderRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrderResponse {
    pub status: String,
    /// Wallet euros credited for this order.
    pub euros: f64,
    /// Balance after the credit.
    pub balance: f64,
    pub transaction: Transaction,
    /// True when this order had already been credited and the original
    /// transaction is being returned.
    pub already_captured: bool,
}

/// Create a checkout order for wallet euros.
#[utoipa::path(
    post,
    path = "/api/paypal/create-order",
    tag = "Payments",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "Payments are not configured")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<Json<CreateOrderResponse>> {
    let order = PaymentService::new(&state)
        .create_order(&user.user_id, request.euros)
        .await?;
    Ok(Json(CreateOrderResponse {
        order_id: order.order_id,
        status: order.status,
        approve_url: order.approve_url,
    }))
}

/// Capture an approved order and credit the wallet.
#[utoipa::path(
    post,
    path = "/api/paypal/capture-order",
    tag = "Payments",
    request_body = CaptureOrderRequest,
    responses(
        (status = 200, description = "Order captured and credited", body = CaptureOrderResponse),
        (status = 400, description = "Missing order id or incomplete payment"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Order belongs to another account"),
        (status = 503, description = "Payments are not configured")
    )
)]
pub async fn capture_order(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<CaptureOrderRequest>,
) -> ApiResult<Json<CaptureOrderResponse>> {
    let outcome = PaymentService::new(&state)
        .capture_order(&user.user_id, &request.order_id)
        .await?;
    Ok(Json(CaptureOrderResponse {
        status: outcome.transaction.status.clone(),
        euros: outcome.transaction.euros,
        balance: outcome.new_balance,
        transaction: outcome.transaction,
        already_captured: outcome.already_captured,
    }))
}
