// SPDX-License-Identifier: AGPL-3.0-or-later

//! Account lifecycle: registration, email verification, login, sessions.

use chrono::Utc;

use crate::error::{ApiError, ApiResult};
use crate::models::{PublicUser, Session, User, UserUpdate, VerificationToken};
use crate::providers::{GoogleAuthError, GoogleIdentity};
use crate::security::{
    generate_session_token, generate_verification_token, hash_password, verify_password,
};
use crate::state::AppState;
use crate::storage::repository::{CreateUserOutcome, SessionRepository, UserRepository};

const MIN_PASSWORD_LEN: usize = 8;

/// Result of a resend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    /// The account was already verified; nothing was sent.
    AlreadyVerified,
}

pub struct IdentityService<'a> {
    state: &'a AppState,
}

impl<'a> IdentityService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Register a password account and send the verification email.
    ///
    /// The very first password registration is promoted to admin when no
    /// admin exists, so a fresh deployment has someone who can manage it.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ApiResult<PublicUser> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(ApiError::bad_request("A valid email is required"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request(
                "Password must be at least 8 characters",
            ));
        }
        if display_name.trim().is_empty() {
            return Err(ApiError::bad_request("Display name is required"));
        }

        let credential = hash_password(password)?;
        let token = generate_verification_token().map_err(ApiError::internal)?;
        let user = User::new_with_password(email, display_name, credential, token.clone());

        let users = UserRepository::new(&self.state.store);
        let outcome = users.create(user, true).await?;
        let user = match outcome {
            CreateUserOutcome::Created {
                user,
                promoted_to_admin,
            } => {
                if promoted_to_admin {
                    tracing::warn!(
                        email = %user.email,
                        "No admin account existed; promoting first registered user"
                    );
                }
                user
            }
            CreateUserOutcome::DuplicateEmail => {
                return Err(ApiError::conflict("Email is already registered"));
            }
        };

        self.spawn_verification_email(user.email.clone(), token);
        Ok(user.sanitized())
    }

    /// Issue a fresh verification token and resend the email. Resending for
    /// an already-verified account is a no-op, not an error.
    pub async fn resend_verification(&self, email: &str) -> ApiResult<ResendOutcome> {
        let users = UserRepository::new(&self.state.store);
        let user = users
            .get_by_email(email)
            .await?
            .ok_or_else(|| ApiError::not_found("No account found for this email"))?;

        if user.verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        let token = generate_verification_token().map_err(ApiError::internal)?;
        users
            .update(
                &user.id,
                UserUpdate {
                    verification: Some(Some(VerificationToken::new(token.clone()))),
                    ..Default::default()
                },
            )
            .await?;

        self.spawn_verification_email(user.email, token);
        Ok(ResendOutcome::Sent)
    }

    /// Consume a verification token and mark the account verified.
    ///
    /// An unknown (or already consumed) token is a 404; a known but expired
    /// token is a 400, and it stays in place so a resend can replace it.
    pub async fn verify_email(&self, token: &str) -> ApiResult<PublicUser> {
        let users = UserRepository::new(&self.state.store);
        let user = users
            .find_by_verification_token(token)
            .await?
            .ok_or_else(|| ApiError::not_found("Verification token not found"))?;

        if let Some(expires_at) = user.verification_expires_at {
            if expires_at <= Utc::now() {
                return Err(ApiError::bad_request("Verification link has expired"));
            }
        }

        let updated = users
            .update(
                &user.id,
                UserUpdate {
                    verified: Some(true),
                    verification: Some(None),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        Ok(updated.sanitized())
    }

    /// Password login. The password is checked before the verified-email
    /// state, and all credential failures return the same 401, so the
    /// response does not reveal whether an email is registered.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<(PublicUser, Session)> {
        let invalid = || ApiError::unauthorized("Invalid email or password");

        let users = UserRepository::new(&self.state.store);
        let user = users.get_by_email(email).await?.ok_or_else(invalid)?;

        let (Some(salt), Some(hash)) = (&user.salt, &user.password_hash) else {
            // Google-only account; indistinguishable from a wrong password.
            return Err(invalid());
        };
        if !verify_password(password, salt, hash) {
            return Err(invalid());
        }

        if !user.verified {
            return Err(ApiError::forbidden("Email is not verified"));
        }

        let session = self.open_session(&user.id).await?;
        Ok((user.sanitized(), session))
    }

    /// Login or sign-up with a verified Google ID token.
    pub async fn google_login(&self, id_token: &str) -> ApiResult<(PublicUser, Session)> {
        let identity = self
            .state
            .google
            .verify(id_token)
            .await
            .map_err(|e| match e {
                GoogleAuthError::InvalidToken(msg) => ApiError::unauthorized(msg),
                GoogleAuthError::Request(msg) => {
                    tracing::error!(error = %msg, "Google token verification failed");
                    ApiError::upstream(None, "Google sign-in is unavailable")
                }
            })?;

        self.login_with_google_identity(identity).await
    }

    /// Resolve a verified Google identity to a local account, linking or
    /// creating one as needed, and open a session for it.
    pub async fn login_with_google_identity(
        &self,
        identity: GoogleIdentity,
    ) -> ApiResult<(PublicUser, Session)> {
        let users = UserRepository::new(&self.state.store);

        let user = match users.get_by_email(&identity.email).await? {
            Some(existing) => match &existing.google_id {
                Some(google_id) if *google_id != identity.google_id => {
                    return Err(ApiError::unauthorized(
                        "Google account does not match this email",
                    ));
                }
                Some(_) => existing,
                None => {
                    // Link Google to the existing password account. Google
                    // has verified the address, so the account counts as
                    // verified from here on.
                    users
                        .update(
                            &existing.id,
                            UserUpdate {
                                google_id: Some(identity.google_id.clone()),
                                verified: Some(true),
                                verification: Some(None),
                                ..Default::default()
                            },
                        )
                        .await?
                        .ok_or_else(|| ApiError::not_found("User not found"))?
                }
            },
            None => {
                let user = User::new_from_google(
                    &identity.email,
                    &identity.google_id,
                    &identity.display_name,
                );
                // Google sign-ups never bootstrap the admin role.
                match users.create(user, false).await? {
                    CreateUserOutcome::Created { user, .. } => user,
                    CreateUserOutcome::DuplicateEmail => {
                        return Err(ApiError::conflict("Email is already registered"));
                    }
                }
            }
        };

        let session = self.open_session(&user.id).await?;
        Ok((user.sanitized(), session))
    }

    /// Revoke a session. Deleting an already-absent token is not an error,
    /// so logout is idempotent.
    pub async fn logout(&self, token: &str) -> ApiResult<()> {
        SessionRepository::new(&self.state.store)
            .delete(token)
            .await?;
        Ok(())
    }

    /// The sanitized account behind an authenticated session.
    pub async fn current_user(&self, user_id: &str) -> ApiResult<PublicUser> {
        let user = UserRepository::new(&self.state.store)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(user.sanitized())
    }

    async fn open_session(&self, user_id: &str) -> ApiResult<Session> {
        let token = generate_session_token().map_err(ApiError::internal)?;
        let session = Session::new(token, user_id);
        SessionRepository::new(&self.state.store)
            .insert(&session)
            .await?;
        Ok(session)
    }

    /// Send the verification email in the background; a failed send is
    /// logged but never fails the request that triggered it.
    fn spawn_verification_email(&self, email: String, token: String) {
        let sender = self.state.email.clone();
        let link = self.state.config.verification_url(&token);

        tokio::spawn(async move {
            let html = format!(
                "<p>Welcome to the arcade!</p>\
                 <p>Please <a href=\"{link}\">verify your email</a> to activate your account.</p>\
                 <p>The link is valid for 24 hours.</p>"
            );
            if let Err(e) = sender.send(&email, "Verify your account", &html).await {
                tracing::warn!(to = %email, error = %e, "Failed to send verification email");
            }
        });
    }
}
