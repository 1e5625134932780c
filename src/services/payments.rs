// SPDX-License-Identifier: AGPL-3.0-or-later

//! Checkout orchestration: price quoting, order creation and capture.
//!
//! Wallet euros are priced at `EURO_UNIT_PRICE` in the checkout currency.
//! Captures are tied back to the buying account through the order's
//! `custom_id` and credited through [`WalletService::record_capture`], which
//! makes a replayed capture harmless.

use crate::error::{ApiError, ApiResult};
use crate::models::round_cents;
use crate::providers::{CapturedOrder, CreatedOrder, PayPalClient, PayPalError};
use crate::services::wallet::{CaptureOutcome, WalletService};
use crate::state::AppState;

pub struct PaymentService<'a> {
    state: &'a AppState,
}

impl<'a> PaymentService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a checkout order for `euros` wallet euros, priced at the
    /// configured unit price.
    pub async fn create_order(&self, user_id: &str, euros: f64) -> ApiResult<CreatedOrder> {
        let client = self.client()?;

        if !euros.is_finite() || euros <= 0.0 {
            return Err(ApiError::bad_request(
                "Amount must be a positive number of euros",
            ));
        }

        let total = round_cents(euros * self.state.config.euro_unit_price);
        if total <= 0.0 {
            return Err(ApiError::bad_request("Amount is too small to charge"));
        }

        client
            .create_order(&format!("{total:.2}"), user_id)
            .await
            .map_err(map_paypal_error)
    }

    /// Capture an approved order and credit the buyer's wallet.
    pub async fn capture_order(&self, user_id: &str, order_id: &str) -> ApiResult<CaptureOutcome> {
        let client = self.client()?;

        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(ApiError::bad_request("An order id is required"));
        }

        let captured = client
            .capture_order(order_id)
            .await
            .map_err(map_paypal_error)?;

        self.apply_capture(user_id, &captured).await
    }

    /// Validate a captured order against the caller and credit the wallet.
    ///
    /// Split from the network call so the ownership and crediting rules are
    /// testable without a PayPal round trip.
    pub async fn apply_capture(
        &self,
        user_id: &str,
        captured: &CapturedOrder,
    ) -> ApiResult<CaptureOutcome> {
        if let Some(custom_id) = &captured.custom_id {
            if custom_id != user_id {
                tracing::warn!(
                    user_id = %user_id,
                    order_id = %captured.order_id,
                    "Capture attempted against an order created by another account"
                );
                return Err(ApiError::forbidden("Order belongs to another account"));
            }
        }

        if captured.status != "COMPLETED" {
            return Err(ApiError::bad_request(format!(
                "Payment is not completed (status: {})",
                captured.status
            )));
        }

        let euros = round_cents(captured.amount_value / self.state.config.euro_unit_price);
        WalletService::new(&self.state.store)
            .record_capture(user_id, captured, euros)
            .await
    }

    fn client(&self) -> ApiResult<&PayPalClient> {
        self.state
            .paypal
            .as_deref()
            .ok_or_else(|| ApiError::service_unavailable("Payments are not configured"))
    }
}

fn map_paypal_error(err: PayPalError) -> ApiError {
    match err {
        PayPalError::MissingConfig(detail) => {
            tracing::error!(detail = %detail, "PayPal misconfigured");
            ApiError::service_unavailable("Payments are not configured")
        }
        PayPalError::Auth(detail) => {
            tracing::error!(detail = %detail, "PayPal authentication failed");
            ApiError::upstream(None, "Payment provider authentication failed")
        }
        PayPalError::Request { status, message } => {
            tracing::error!(status = ?status, detail = %message, "PayPal request failed");
            ApiError::upstream(status, "Payment provider rejected the request")
        }
        PayPalError::InvalidResponse(detail) => {
            tracing::error!(detail = %detail, "PayPal returned an invalid response");
            ApiError::upstream(None, "Payment provider returned an invalid response")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::security::hash_password;
    use crate::storage::repository::{CreateUserOutcome, UserRepository};

    async fn state_with_user(unit_price: f64) -> (AppState, tempfile::TempDir, String) {
        let (mut state, temp_dir) = AppState::for_tests();
        {
            let config = std::sync::Arc::get_mut(&mut state.config).expect("unshared config");
            config.euro_unit_price = unit_price;
        }

        let user = User::new_with_password(
            "buyer@x.com",
            "Buyer",
            hash_password("pw12345678").unwrap(),
            "tok".into(),
        );
        let created = UserRepository::new(&state.store)
            .create(user, false)
            .await
            .unwrap();
        let user_id = match created {
            CreateUserOutcome::Created { user, .. } => user.id,
            _ => panic!("create failed"),
        };
        (state, temp_dir, user_id)
    }

    fn captured_for(user_id: &str, order_id: &str, amount: f64, status: &str) -> CapturedOrder {
        CapturedOrder {
            order_id: order_id.to_string(),
            status: status.to_string(),
            amount_value: amount,
            currency: "USD".to_string(),
            custom_id: Some(user_id.to_string()),
        }
    }

    #[tokio::test]
    async fn create_order_requires_paypal_configuration() {
        let (state, _temp_dir, user_id) = state_with_user(1.0).await;
        let err = PaymentService::new(&state)
            .create_order(&user_id, 10.0)
            .await
            .unwrap_err();
        assert_eq!(err.status, 503);
    }

    #[tokio::test]
    async fn apply_capture_credits_at_the_unit_price() {
        let (state, _temp_dir, user_id) = state_with_user(2.0).await;
        let service = PaymentService::new(&state);

        // Paid 10.00 at 2.00 per euro: 5 wallet euros.
        let outcome = service
            .apply_capture(&user_id, &captured_for(&user_id, "ORDER-1", 10.0, "COMPLETED"))
            .await
            .unwrap();
        assert_eq!(outcome.new_balance, 5.0);
        assert_eq!(outcome.transaction.euros, 5.0);
        assert_eq!(outcome.transaction.amount_paid, 10.0);
    }

    #[tokio::test]
    async fn apply_capture_rejects_foreign_orders() {
        let (state, _temp_dir, user_id) = state_with_user(1.0).await;
        let service = PaymentService::new(&state);

        let foreign = captured_for("someone-else", "ORDER-2", 10.0, "COMPLETED");
        let err = service.apply_capture(&user_id, &foreign).await.unwrap_err();
        assert_eq!(err.status, 403);

        // Nothing was credited.
        let balance = WalletService::new(&state.store)
            .get_balance(&user_id)
            .await
            .unwrap();
        assert_eq!(balance, 0.0);
    }

    #[tokio::test]
    async fn apply_capture_rejects_incomplete_payments() {
        let (state, _temp_dir, user_id) = state_with_user(1.0).await;
        let err = PaymentService::new(&state)
            .apply_capture(&user_id, &captured_for(&user_id, "ORDER-3", 10.0, "PENDING"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn apply_capture_without_custom_id_still_credits() {
        let (state, _temp_dir, user_id) = state_with_user(1.0).await;
        let mut order = captured_for(&user_id, "ORDER-4", 3.0, "COMPLETED");
        order.custom_id = None;

        let outcome = PaymentService::new(&state)
            .apply_capture(&user_id, &order)
            .await
            .unwrap();
        assert_eq!(outcome.new_balance, 3.0);
    }

    #[tokio::test]
    async fn replayed_capture_does_not_double_credit() {
        let (state, _temp_dir, user_id) = state_with_user(1.0).await;
        let service = PaymentService::new(&state);
        let order = captured_for(&user_id, "ORDER-5", 7.5, "COMPLETED");

        let first = service.apply_capture(&user_id, &order).await.unwrap();
        let second = service.apply_capture(&user_id, &order).await.unwrap();

        assert!(!first.already_captured);
        assert!(second.already_captured);
        assert_eq!(second.new_balance, 7.5);
    }

    #[test]
    fn paypal_errors_map_to_upstream_statuses() {
        let err = map_paypal_error(PayPalError::Request {
            status: Some(422),
            message: "bad order".to_string(),
        });
        assert_eq!(err.status, 422);

        let err = map_paypal_error(PayPalError::InvalidResponse("junk".to_string()));
        assert_eq!(err.status, 502);

        let err = map_paypal_error(PayPalError::MissingConfig("id".to_string()));
        assert_eq!(err.status, 503);
    }
}
