// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Every
//! variable has a workable default, so a bare `cargo run` serves a local
//! instance with the file-based email outbox and payments disabled.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the JSON collections | `data` |
//! | `APP_URL` | Public base URL used in verification links | `http://localhost:8080` |
//! | `EURO_UNIT_PRICE` | Price charged per wallet euro, in `PAYPAL_CURRENCY` | `1.0` |
//! | `PAYPAL_CLIENT_ID` | PayPal REST client id | unset (payments disabled) |
//! | `PAYPAL_CLIENT_SECRET` | PayPal REST client secret | unset (payments disabled) |
//! | `PAYPAL_API_BASE` | PayPal API base URL | `https://api-m.sandbox.paypal.com` |
//! | `PAYPAL_CURRENCY` | Checkout currency code | `USD` |
//! | `GOOGLE_CLIENT_ID` | OAuth client id checked against the token audience | unset (audience not checked) |
//! | `MAILGUN_API_KEY` | Mailgun API key | unset (outbox transport) |
//! | `MAILGUN_DOMAIN` | Mailgun sending domain | unset (outbox transport) |
//! | `MAIL_FROM` | From address on outgoing mail | `Arcade <no-reply@localhost>` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use crate::storage::DEFAULT_DATA_ROOT;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server bind address
    pub host: String,
    /// Server bind port
    pub port: u16,
    /// Root directory for the JSON collections
    pub data_dir: PathBuf,
    /// Public base URL, used to build verification links
    pub app_url: String,
    /// Price of one wallet euro in the checkout currency
    pub euro_unit_price: f64,

    // --- PayPal (payments disabled when id/secret are unset) ---
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_api_base: String,
    pub paypal_currency: String,

    // --- Google sign-in ---
    /// When set, Google tokens must carry this audience
    pub google_client_id: Option<String>,

    // --- Email ---
    pub mailgun_api_key: Option<String>,
    pub mailgun_domain: Option<String>,
    pub mail_from: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let euro_unit_price = env::var("EURO_UNIT_PRICE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|price| price.is_finite() && *price > 0.0)
            .unwrap_or_else(|| {
                tracing::debug!("EURO_UNIT_PRICE unset or invalid, using 1.0");
                1.0
            });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_ROOT)),
            app_url: env::var("APP_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            euro_unit_price,
            paypal_client_id: non_empty(env::var("PAYPAL_CLIENT_ID").ok()),
            paypal_client_secret: non_empty(env::var("PAYPAL_CLIENT_SECRET").ok()),
            paypal_api_base: env::var("PAYPAL_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".to_string()),
            paypal_currency: env::var("PAYPAL_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            google_client_id: non_empty(env::var("GOOGLE_CLIENT_ID").ok()),
            mailgun_api_key: non_empty(env::var("MAILGUN_API_KEY").ok()),
            mailgun_domain: non_empty(env::var("MAILGUN_DOMAIN").ok()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Arcade <no-reply@localhost>".to_string()),
        }
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Verification link for an emailed token.
    pub fn verification_url(&self, token: &str) -> String {
        format!("{}/verify.html?token={token}", self.app_url)
    }
}

impl Default for AppConfig {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from(DEFAULT_DATA_ROOT),
            app_url: "http://localhost:8080".to_string(),
            euro_unit_price: 1.0,
            paypal_client_id: None,
            paypal_client_secret: None,
            paypal_api_base: "https://api-m.sandbox.paypal.com".to_string(),
            paypal_currency: "USD".to_string(),
            google_client_id: None,
            mailgun_api_key: None,
            mailgun_domain: None,
            mail_from: "Arcade <no-reply@localhost>".to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn verification_url_embeds_token() {
        let config = AppConfig::default();
        assert_eq!(
            config.verification_url("abc123"),
            "http://localhost:8080/verify.html?token=abc123"
        );
    }

    #[test]
    fn non_empty_filters_blank_values() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" id ".to_string())), Some("id".to_string()));
    }
}
