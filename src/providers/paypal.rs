// SPDX-License-Identifier: AGPL-3.0-or-later

//! PayPal Checkout integration for wallet top-ups.
//!
//! Orders are created with the purchasing user's id as `custom_id`, so a
//! captured order can be tied back to the account that initiated it.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AppConfig;

const DEFAULT_API_BASE_URL: &str = "https://api-m.sandbox.paypal.com";

#[derive(Debug, thiserror::Error)]
pub enum PayPalError {
    #[error("PayPal configuration missing: {0}")]
    MissingConfig(String),

    #[error("PayPal auth failed: {0}")]
    Auth(String),

    #[error("PayPal request failed ({status:?}): {message}")]
    Request {
        /// Upstream HTTP status, when one was received.
        status: Option<u16>,
        message: String,
    },

    #[error("PayPal response was invalid: {0}")]
    InvalidResponse(String),
}

/// A created (not yet paid) checkout order.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: String,
    pub status: String,
    /// Buyer approval URL from the order's `links`.
    pub approve_url: Option<String>,
}

/// A captured order as reported by PayPal.
#[derive(Debug, Clone)]
pub struct CapturedOrder {
    pub order_id: String,
    pub status: String,
    /// Amount actually charged.
    pub amount_value: f64,
    pub currency: String,
    /// The `custom_id` set at order creation (the purchasing user's id).
    pub custom_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PayPalClient {
    api_base_url: String,
    client_id: String,
    client_secret: String,
    currency: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

impl PayPalClient {
    /// Build a client from configuration. Returns `Ok(None)` when PayPal
    /// credentials are not configured, which disables the payment routes.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, PayPalError> {
        let (Some(client_id), Some(client_secret)) = (
            config.paypal_client_id.clone(),
            config.paypal_client_secret.clone(),
        ) else {
            return Ok(None);
        };

        let api_base_url = if config.paypal_api_base.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            config.paypal_api_base.trim_end_matches('/').to_string()
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| PayPalError::Request {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Some(Self {
            api_base_url,
            client_id,
            client_secret,
            currency: config.paypal_currency.to_ascii_uppercase(),
            http,
        }))
    }

    /// Checkout currency code.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a checkout order for `value` (decimal string, e.g. `"9.50"`).
    pub async fn create_order(
        &self,
        value: &str,
        custom_id: &str,
    ) -> Result<CreatedOrder, PayPalError> {
        let payload = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": self.currency,
                    "value": value
                },
                "custom_id": custom_id
            }]
        });

        let response = self.post_json("/v2/checkout/orders", &payload).await?;
        parse_created_order(&response)
    }

    /// Capture an approved order.
    pub async fn capture_order(&self, order_id: &str) -> Result<CapturedOrder, PayPalError> {
        let path = format!("/v2/checkout/orders/{order_id}/capture");
        let response = self.post_json(&path, &json!({})).await?;
        parse_captured_order(order_id, &response)
    }

    async fn access_token(&self) -> Result<String, PayPalError> {
        let mut form = HashMap::new();
        form.insert("grant_type".to_string(), "client_credentials".to_string());

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| PayPalError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Auth(format!(
                "token request returned {status}: {body}"
            )));
        }

        let token_response: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| PayPalError::Auth(format!("invalid token response: {e}")))?;

        if token_response.access_token.trim().is_empty() {
            return Err(PayPalError::Auth(
                "token response did not include access_token".to_string(),
            ));
        }

        Ok(token_response.access_token)
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, PayPalError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}{}", self.api_base_url, path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| PayPalError::Request {
                status: None,
                message: format!("POST {path} failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Request {
                status: Some(status.as_u16()),
                message: format!("POST {path} returned {status}: {body}"),
            });
        }

        response.json().await.map_err(|e| {
            PayPalError::InvalidResponse(format!("POST {path} invalid JSON: {e}"))
        })
    }
}

fn parse_created_order(response: &Value) -> Result<CreatedOrder, PayPalError> {
    let order_id = response
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| PayPalError::InvalidResponse("missing order id in response".to_string()))?
        .to_string();

    let status = response
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("CREATED")
        .to_string();

    let approve_url = response
        .get("links")
        .and_then(Value::as_array)
        .and_then(|links| {
            links.iter().find(|link| {
                link.get("rel").and_then(Value::as_str) == Some("approve")
            })
        })
        .and_then(|link| link.get("href").and_then(Value::as_str))
        .map(str::to_string);

    Ok(CreatedOrder {
        order_id,
        status,
        approve_url,
    })
}

fn parse_captured_order(order_id: &str, response: &Value) -> Result<CapturedOrder, PayPalError> {
    let status = response
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            PayPalError::InvalidResponse("missing capture status in response".to_string())
        })?
        .to_string();

    let capture = response
        .pointer("/purchase_units/0/payments/captures/0")
        .ok_or_else(|| {
            PayPalError::InvalidResponse("missing capture record in response".to_string())
        })?;

    let amount_value = capture
        .pointer("/amount/value")
        .and_then(Value::as_str)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| {
            PayPalError::InvalidResponse("missing capture amount in response".to_string())
        })?;

    let currency = capture
        .pointer("/amount/currency_code")
        .and_then(Value::as_str)
        .unwrap_or("USD")
        .to_string();

    let custom_id = capture
        .get("custom_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(CapturedOrder {
        order_id: order_id.to_string(),
        status,
        amount_value,
        currency,
        custom_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_is_none_without_credentials() {
        let config = AppConfig::default();
        let client = PayPalClient::from_config(&config).unwrap();
        assert!(client.is_none());
    }

    #[test]
    fn from_config_builds_client_with_credentials() {
        let config = AppConfig {
            paypal_client_id: Some("id".to_string()),
            paypal_client_secret: Some("secret".to_string()),
            paypal_currency: "eur".to_string(),
            ..AppConfig::default()
        };
        let client = PayPalClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.currency(), "EUR");
    }

    #[test]
    fn parse_created_order_reads_id_and_approve_link() {
        let response = json!({
            "id": "ORDER-1",
            "status": "CREATED",
            "links": [
                { "rel": "self", "href": "https://api.example/orders/ORDER-1" },
                { "rel": "approve", "href": "https://www.example/checkoutnow?token=ORDER-1" }
            ]
        });
        let order = parse_created_order(&response).unwrap();
        assert_eq!(order.order_id, "ORDER-1");
        assert_eq!(order.status, "CREATED");
        assert_eq!(
            order.approve_url.as_deref(),
            Some("https://www.example/checkoutnow?token=ORDER-1")
        );
    }

    #[test]
    fn parse_created_order_rejects_missing_id() {
        let response = json!({ "status": "CREATED" });
        assert!(matches!(
            parse_created_order(&response),
            Err(PayPalError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parse_captured_order_reads_capture_details() {
        let response = json!({
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "amount": { "value": "9.50", "currency_code": "USD" },
                        "custom_id": "user-123"
                    }]
                }
            }]
        });
        let captured = parse_captured_order("ORDER-2", &response).unwrap();
        assert_eq!(captured.order_id, "ORDER-2");
        assert_eq!(captured.status, "COMPLETED");
        assert_eq!(captured.amount_value, 9.50);
        assert_eq!(captured.currency, "USD");
        assert_eq!(captured.custom_id.as_deref(), Some("user-123"));
    }

    #[test]
    fn parse_captured_order_rejects_missing_capture() {
        let response = json!({ "status": "COMPLETED", "purchase_units": [] });
        assert!(matches!(
            parse_captured_order("ORDER-3", &response),
            Err(PayPalError::InvalidResponse(_))
        ));
    }
}
