// SPDX-License-Identifier: AGPL-3.0-or-later

//! Account endpoints: register, verify, login, Google sign-in, logout.
//!
//! Login responses return the session token in the body (for API clients)
//! and set it as an HttpOnly cookie (for browsers).

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Auth, SESSION_COOKIE};
use crate::error::ApiResult;
use crate::models::PublicUser;
use crate::services::{IdentityService, ResendOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Login result: the sanitized user plus the opaque session token.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a password account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = UserResponse),
        (status = 400, description = "Invalid email, password or display name"),
        (status = 409, description = "Email is already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = IdentityService::new(&state)
        .register(&request.email, &request.password, &request.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Consume an emailed verification token.
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Account verified", body = UserResponse),
        (status = 400, description = "Verification link has expired"),
        (status = 404, description = "Unknown or already used token")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = IdentityService::new(&state)
        .verify_email(&request.token)
        .await?;
    Ok(Json(UserResponse { user }))
}

/// Resend the verification email with a fresh token.
#[utoipa::path(
    post,
    path = "/api/auth/resend",
    tag = "Auth",
    request_body = ResendRequest,
    responses(
        (status = 200, description = "Verification email resent, or account already verified", body = MessageResponse),
        (status = 404, description = "No account for this email")
    )
)]
pub async fn resend(
    State(state): State<AppState>,
    Json(request): Json<ResendRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let outcome = IdentityService::new(&state)
        .resend_verification(&request.email)
        .await?;
    let message = match outcome {
        ResendOutcome::Sent => "Verification email sent",
        ResendOutcome::AlreadyVerified => "Account is already verified",
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// Password login.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Email is not verified")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    let (user, session) = IdentityService::new(&state)
        .login(&request.email, &request.password)
        .await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((
        jar,
        Json(SessionResponse {
            user,
            token: session.token,
        }),
    ))
}

/// Login or sign-up with a Google ID token.
#[utoipa::path(
    post,
    path = "/api/auth/google",
    tag = "Auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Google token rejected"),
        (status = 502, description = "Google verification unavailable")
    )
)]
pub async fn google(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<GoogleLoginRequest>,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    let (user, session) = IdentityService::new(&state)
        .google_login(&request.id_token)
        .await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((
        jar,
        Json(SessionResponse {
            user,
            token: session.token,
        }),
    ))
}

/// Revoke the current session and clear the cookie. Idempotent.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(token) = request_token(&headers, &jar) {
        IdentityService::new(&state).logout(&token).await?;
    }

    let jar = jar.remove(session_cookie(String::new()));
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// The authenticated account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> ApiResult<Json<UserResponse>> {
    let user = IdentityService::new(&state)
        .current_user(&user.user_id)
        .await?;
    Ok(Json(UserResponse { user }))
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn request_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}
