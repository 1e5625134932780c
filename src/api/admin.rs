// SPDX-License-Identifier: AGPL-3.0-or-later

//! Admin endpoints: balance overrides and account lookup.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::AdminOnly;
use crate::error::{ApiError, ApiResult};
use crate::models::PublicUser;
use crate::services::WalletService;
use crate::state::AppState;
use crate::storage::repository::UserRepository;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetBalanceRequest {
    pub user_id: String,
    /// Accepted as a number or numeric string; anything else counts as 0.
    #[schema(value_type = Object)]
    pub amount: Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetBalanceResponse {
    pub user_id: String,
    pub balance: f64,
}

/// Lookup key: either field may be given; id wins when both are.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindUserRequest {
    pub email: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FindUserResponse {
    pub user: PublicUser,
}

/// Overwrite a user's balance.
#[utoipa::path(
    post,
    path = "/api/coins/update",
    tag = "Admin",
    request_body = SetBalanceRequest,
    responses(
        (status = 200, description = "Balance updated", body = SetBalanceResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn set_balance(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Json(request): Json<SetBalanceRequest>,
) -> ApiResult<Json<SetBalanceResponse>> {
    let balance = WalletService::new(&state.store)
        .set_balance(&request.user_id, &request.amount)
        .await?;

    tracing::info!(
        admin = %admin.email,
        user_id = %request.user_id,
        balance = balance,
        "Admin balance override"
    );

    Ok(Json(SetBalanceResponse {
        user_id: request.user_id,
        balance,
    }))
}

/// Look up an account by id or email.
#[utoipa::path(
    post,
    path = "/api/admin/users/find",
    tag = "Admin",
    request_body = FindUserRequest,
    responses(
        (status = 200, description = "Matching account", body = FindUserResponse),
        (status = 400, description = "Neither userId nor email given"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "No matching account")
    )
)]
pub async fn find_user(
    State(state): State<AppState>,
    AdminOnly(_admin): AdminOnly,
    Json(request): Json<FindUserRequest>,
) -> ApiResult<Json<FindUserResponse>> {
    let users = UserRepository::new(&state.store);

    let user = if let Some(user_id) = request.user_id.as_deref().filter(|s| !s.trim().is_empty()) {
        users.get_by_id(user_id.trim()).await?
    } else if let Some(email) = request.email.as_deref().filter(|s| !s.trim().is_empty()) {
        users.get_by_email(email.trim()).await?
    } else {
        return Err(ApiError::bad_request("Provide a userId or an email"));
    };

    let user = user.ok_or_else(|| ApiError::not_found("No matching account"))?;
    Ok(Json(FindUserResponse {
        user: user.sanitized(),
    }))
}
