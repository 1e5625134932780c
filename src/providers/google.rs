// SPDX-License-Identifier: AGPL-3.0-or-later

//! Google ID token verification via the `tokeninfo` endpoint.
//!
//! The frontend obtains an ID token through Google Sign-In and posts it to
//! the server, which asks Google to validate it. When a client id is
//! configured, the token's audience must match it.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("Google token rejected: {0}")]
    InvalidToken(String),

    #[error("Google token request failed: {0}")]
    Request(String),
}

/// A verified Google identity.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    /// Google's stable subject id for the account.
    pub google_id: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct GoogleVerifier {
    tokeninfo_url: String,
    /// Expected audience; unset skips the audience check.
    client_id: Option<String>,
    http: Client,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
            client_id,
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Verify an ID token with Google and extract the identity behind it.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleAuthError> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| GoogleAuthError::Request(format!("tokeninfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GoogleAuthError::InvalidToken(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::Request(format!("invalid tokeninfo JSON: {e}")))?;

        identity_from_payload(&payload, self.client_id.as_deref())
    }
}

/// Validate the tokeninfo payload and pull out the identity fields.
fn identity_from_payload(
    payload: &Value,
    expected_audience: Option<&str>,
) -> Result<GoogleIdentity, GoogleAuthError> {
    if let Some(expected) = expected_audience {
        let audience = payload.get("aud").and_then(Value::as_str).unwrap_or("");
        if audience != expected {
            return Err(GoogleAuthError::InvalidToken(
                "token audience mismatch".to_string(),
            ));
        }
    }

    // tokeninfo reports email_verified as the string "true" (or a bool in
    // some variants); anything else is treated as unverified.
    let email_verified = match payload.get("email_verified") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s == "true",
        _ => false,
    };
    if !email_verified {
        return Err(GoogleAuthError::InvalidToken(
            "Google email is not verified".to_string(),
        ));
    }

    let google_id = payload
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(|| GoogleAuthError::InvalidToken("missing subject".to_string()))?
        .to_string();

    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| GoogleAuthError::InvalidToken("missing email".to_string()))?
        .to_lowercase();

    let display_name = payload
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.clone());

    Ok(GoogleIdentity {
        google_id,
        email,
        display_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_valid_payload() {
        let payload = json!({
            "aud": "client-1",
            "sub": "google-123",
            "email": "Player@X.com",
            "email_verified": "true",
            "name": "Player One"
        });
        let identity = identity_from_payload(&payload, Some("client-1")).unwrap();
        assert_eq!(identity.google_id, "google-123");
        assert_eq!(identity.email, "player@x.com");
        assert_eq!(identity.display_name, "Player One");
    }

    #[test]
    fn rejects_audience_mismatch() {
        let payload = json!({
            "aud": "someone-else",
            "sub": "google-123",
            "email": "p@x.com",
            "email_verified": "true"
        });
        assert!(matches!(
            identity_from_payload(&payload, Some("client-1")),
            Err(GoogleAuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn skips_audience_check_when_unconfigured() {
        let payload = json!({
            "aud": "anything",
            "sub": "google-123",
            "email": "p@x.com",
            "email_verified": true
        });
        assert!(identity_from_payload(&payload, None).is_ok());
    }

    #[test]
    fn rejects_unverified_email() {
        let payload = json!({
            "sub": "google-123",
            "email": "p@x.com",
            "email_verified": "false"
        });
        assert!(matches!(
            identity_from_payload(&payload, None),
            Err(GoogleAuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn falls_back_to_email_for_missing_name() {
        let payload = json!({
            "sub": "google-123",
            "email": "p@x.com",
            "email_verified": "true"
        });
        let identity = identity_from_payload(&payload, None).unwrap();
        assert_eq!(identity.display_name, "p@x.com");
    }
}
