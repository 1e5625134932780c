// SPDX-License-Identifier: AGPL-3.0-or-later

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Public, non-secret configuration for the frontend.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    /// Google OAuth client id for the sign-in button, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_client_id: Option<String>,
    /// Whether the PayPal checkout routes are live.
    pub payments_enabled: bool,
    /// Checkout currency code.
    pub currency: String,
    /// Price of one wallet euro in the checkout currency.
    pub euro_unit_price: f64,
}

/// Frontend bootstrap configuration.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Config",
    responses(
        (status = 200, description = "Public configuration", body = PublicConfig)
    )
)]
pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        google_client_id: state.config.google_client_id.clone(),
        payments_enabled: state.paypal.is_some(),
        currency: state.config.paypal_currency.clone(),
        euro_unit_price: state.config.euro_unit_price,
    })
}
