// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Persistent Data Models
//!
//! Entities stored in the flat-file collections (`users.json`,
//! `sessions.json`, `transactions.json`) plus the sanitized user projection
//! returned by the API. Field names serialize in camelCase to stay
//! compatible with the legacy dataset layout.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::security::{PasswordCredential, SESSION_TTL_SECONDS, VERIFICATION_TTL_SECONDS};

// =============================================================================
// User
// =============================================================================

/// A registered account.
///
/// `password_hash`/`salt` are `None` for Google-only accounts. The
/// verification token is single-use and cleared once consumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Lowercased; unique across users.
    pub email: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub salt: Option<String>,
    /// Unique when present.
    pub google_id: Option<String>,
    pub verified: bool,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub role: Role,
    /// Euro balance, kept non-negative and rounded to cents.
    pub balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New unverified account with a password credential and a pending
    /// verification token.
    pub fn new_with_password(
        email: &str,
        display_name: &str,
        credential: PasswordCredential,
        verification_token: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            display_name: display_name.trim().to_string(),
            password_hash: Some(credential.hash),
            salt: Some(credential.salt),
            google_id: None,
            verified: false,
            verification_token: Some(verification_token),
            verification_expires_at: Some(now + Duration::seconds(VERIFICATION_TTL_SECONDS)),
            role: Role::User,
            balance: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// New account created from a verified Google identity. No password
    /// credential; verified from the start.
    pub fn new_from_google(email: &str, google_id: &str, display_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            display_name: display_name.trim().to_string(),
            password_hash: None,
            salt: None,
            google_id: Some(google_id.to_string()),
            verified: true,
            verification_token: None,
            verification_expires_at: None,
            role: Role::User,
            balance: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Strip credentials and the verification token for external exposure.
    pub fn sanitized(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            google_id: self.google_id.clone(),
            verified: self.verified,
            role: self.role,
            balance: self.balance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Sanitized user projection. Never contains `passwordHash`, `salt` or
/// `verificationToken`.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    pub verified: bool,
    pub role: Role,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of mutable user fields.
///
/// All user mutations go through this struct so `updated_at` is always
/// recomputed server-side; there is deliberately no full-object overwrite.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub password: Option<PasswordCredential>,
    pub verified: Option<bool>,
    /// `Some(Some(..))` replaces the token, `Some(None)` clears it.
    pub verification: Option<Option<VerificationToken>>,
    pub google_id: Option<String>,
    pub balance: Option<f64>,
    pub role: Option<Role>,
}

/// A pending verification token with its expiry.
#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Token expiring [`VERIFICATION_TTL_SECONDS`] from now.
    pub fn new(token: String) -> Self {
        Self {
            token,
            expires_at: Utc::now() + Duration::seconds(VERIFICATION_TTL_SECONDS),
        }
    }
}

impl UserUpdate {
    /// Apply the update in place. `updated_at` is always refreshed.
    pub fn apply(self, user: &mut User) {
        if let Some(display_name) = self.display_name {
            user.display_name = display_name;
        }
        if let Some(credential) = self.password {
            user.password_hash = Some(credential.hash);
            user.salt = Some(credential.salt);
        }
        if let Some(verified) = self.verified {
            user.verified = verified;
        }
        if let Some(verification) = self.verification {
            match verification {
                Some(pending) => {
                    user.verification_token = Some(pending.token);
                    user.verification_expires_at = Some(pending.expires_at);
                }
                None => {
                    user.verification_token = None;
                    user.verification_expires_at = None;
                }
            }
        }
        if let Some(google_id) = self.google_id {
            user.google_id = Some(google_id);
        }
        if let Some(balance) = self.balance {
            user.balance = balance;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
    }
}

// =============================================================================
// Session
// =============================================================================

/// An opaque server-side session. Valid only while present in the store and
/// not expired; deleted on logout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Session for `user_id` expiring [`SESSION_TTL_SECONDS`] from now.
    pub fn new(token: String, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            token,
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(SESSION_TTL_SECONDS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// An auditable wallet credit. Append-only: never mutated or deleted, and at
/// most one row ever exists per `(user_id, order_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    /// External payment reference (PayPal order id).
    pub order_id: String,
    /// Euros credited to the wallet.
    pub euros: f64,
    /// What was actually charged, in `currency`.
    pub amount_paid: f64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: &str,
        order_id: &str,
        euros: f64,
        amount_paid: f64,
        currency: &str,
        status: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            order_id: order_id.to_string(),
            euros,
            amount_paid,
            currency: currency.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Round an amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::hash_password;

    #[test]
    fn sanitized_user_has_no_credentials() {
        let cred = hash_password("pw12345678").unwrap();
        let user = User::new_with_password("A@X.com", "Ann", cred, "tok".into());
        assert_eq!(user.email, "a@x.com");

        let public = user.sanitized();
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("salt").is_none());
        assert!(json.get("verificationToken").is_none());
        assert_eq!(json["email"], "a@x.com");
    }

    #[test]
    fn google_user_is_verified_without_password() {
        let user = User::new_from_google("b@x.com", "google-123", "Bob");
        assert!(user.verified);
        assert!(user.password_hash.is_none());
        assert!(user.salt.is_none());
        assert_eq!(user.google_id.as_deref(), Some("google-123"));
    }

    #[test]
    fn update_refreshes_updated_at_and_clears_verification() {
        let cred = hash_password("pw12345678").unwrap();
        let mut user = User::new_with_password("c@x.com", "Cay", cred, "tok".into());
        let before = user.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(5));
        let update = UserUpdate {
            verified: Some(true),
            verification: Some(None),
            ..Default::default()
        };
        update.apply(&mut user);

        assert!(user.verified);
        assert!(user.verification_token.is_none());
        assert!(user.verification_expires_at.is_none());
        assert!(user.updated_at > before);
    }

    #[test]
    fn session_expiry() {
        let session = Session::new("tok".into(), "u1");
        assert!(!session.is_expired(Utc::now()));
        assert!(session.is_expired(Utc::now() + Duration::days(8)));
    }

    #[test]
    fn round_cents_rounds_half_up() {
        assert_eq!(round_cents(7.499_999_9), 7.5);
        assert_eq!(round_cents(10.0 / 3.0), 3.33);
        assert_eq!(round_cents(5.005), 5.01);
    }

    #[test]
    fn user_round_trips_through_json() {
        let user = User::new_from_google("d@x.com", "g-9", "Dee");
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"displayName\""));
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
