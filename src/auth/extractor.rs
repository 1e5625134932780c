// SPDX-License-Identifier: AGPL-3.0-or-later

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! The session token is read from `Authorization: Bearer <token>` or, for
//! browser clients, from the `session_token` cookie. It is an opaque token
//! resolved against the session store, so a logged-out token stops working
//! immediately.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use super::{AuthError, Role};
use crate::state::AppState;
use crate::storage::repository::{SessionRepository, UserRepository};

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "session_token";

/// The resolved identity behind a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Extractor for authenticated users.
///
/// # Example
///
/// ```rust,ignore
/// async fn balance(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<BalanceResponse>, ApiError> {
///     // user.user_id is the session owner's ID
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(AuthError::MissingCredential)?;

        let sessions = SessionRepository::new(&state.store);
        let session = sessions
            .get_valid(&token)
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .ok_or(AuthError::InvalidSession)?;

        let users = UserRepository::new(&state.store);
        let user = users
            .get_by_id(&session.user_id)
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .ok_or(AuthError::InvalidSession)?;

        Ok(Auth(AuthenticatedUser {
            user_id: user.id,
            email: user.email,
            role: user.role,
        }))
    }
}

/// Session token from the Authorization header, falling back to the cookie.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        if let Ok(value) = header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}
