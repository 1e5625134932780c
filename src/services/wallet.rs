// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wallet operations: balance reads, admin writes, and the exactly-once
//! capture recording used by the payment flow.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::{round_cents, Transaction};
use crate::providers::CapturedOrder;
use crate::storage::repository::{TransactionRepository, UserRepository};
use crate::storage::{Collection, JsonStore};

/// Result of recording a capture against the wallet.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub transaction: Transaction,
    pub new_balance: f64,
    /// True when the `(user, order)` pair was already recorded and nothing
    /// was credited this time.
    pub already_captured: bool,
}

pub struct WalletService<'a> {
    store: &'a JsonStore,
}

impl<'a> WalletService<'a> {
    pub fn new(store: &'a JsonStore) -> Self {
        Self { store }
    }

    pub async fn get_balance(&self, user_id: &str) -> ApiResult<f64> {
        let user = UserRepository::new(self.store)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(user.balance)
    }

    /// Admin override of a user's balance. The raw amount is coerced the way
    /// the legacy endpoint did: anything unparsable becomes 0.
    pub async fn set_balance(&self, user_id: &str, amount: &Value) -> ApiResult<f64> {
        let amount = coerce_amount(amount);
        UserRepository::new(self.store)
            .set_balance(user_id, amount)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Add euros to a user's balance. Rejects non-finite deltas.
    pub async fn increment_balance(&self, user_id: &str, delta: f64) -> ApiResult<f64> {
        if !delta.is_finite() {
            return Err(ApiError::bad_request("Amount must be a finite number"));
        }
        UserRepository::new(self.store)
            .increment_balance(user_id, delta)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn list_transactions(&self, user_id: &str) -> ApiResult<Vec<Transaction>> {
        Ok(TransactionRepository::new(self.store)
            .list_for_user(user_id)
            .await?)
    }

    /// Credit a captured order exactly once.
    ///
    /// The uniqueness check, the balance increment and the transaction
    /// append all run while the transactions lock is held, so two captures
    /// of the same order can never both credit. A replay returns the
    /// originally recorded transaction and the current balance. Lock order
    /// is transactions, then users.
    pub async fn record_capture(
        &self,
        user_id: &str,
        order: &CapturedOrder,
        euros: f64,
    ) -> ApiResult<CaptureOutcome> {
        let guard = self.store.collection(Collection::Transactions).await;
        let mut transactions: Vec<Transaction> = guard.read()?;

        if let Some(existing) = transactions
            .iter()
            .find(|t| t.user_id == user_id && t.order_id == order.order_id)
        {
            tracing::info!(
                user_id = %user_id,
                order_id = %order.order_id,
                "Capture replayed; returning recorded transaction"
            );
            let balance = self.get_balance(user_id).await?;
            return Ok(CaptureOutcome {
                transaction: existing.clone(),
                new_balance: balance,
                already_captured: true,
            });
        }

        let new_balance = UserRepository::new(self.store)
            .increment_balance(user_id, euros)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let transaction = Transaction::new(
            user_id,
            &order.order_id,
            round_cents(euros),
            order.amount_value,
            &order.currency,
            &order.status,
        );
        transactions.push(transaction.clone());
        if let Err(e) = guard.write(&transactions) {
            // The credit landed but the idempotency row did not; roll the
            // credit back so a client retry cannot double-credit.
            match UserRepository::new(self.store)
                .increment_balance(user_id, -euros)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => {
                    tracing::error!(
                        user_id = %user_id,
                        order_id = %order.order_id,
                        euros = euros,
                        "Could not roll back credit after failed ledger write"
                    );
                }
            }
            return Err(e.into());
        }

        Ok(CaptureOutcome {
            transaction,
            new_balance,
            already_captured: false,
        })
    }
}

/// Coerce a raw JSON amount to a usable balance value. Numbers and numeric
/// strings pass through; anything else (including negatives and non-finite
/// values) collapses to 0.
fn coerce_amount(value: &Value) -> f64 {
    let amount = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if amount.is_finite() && amount >= 0.0 {
        amount
    } else {
        0.0
    }
}
