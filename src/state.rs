// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::{EmailSender, GoogleVerifier, PayPalClient};
use crate::storage::JsonStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub config: Arc<AppConfig>,
    pub email: Arc<EmailSender>,
    pub google: Arc<GoogleVerifier>,
    /// `None` when PayPal credentials are not configured.
    pub paypal: Option<Arc<PayPalClient>>,
}

impl AppState {
    pub fn new(
        store: JsonStore,
        config: AppConfig,
        email: EmailSender,
        google: GoogleVerifier,
        paypal: Option<PayPalClient>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            email: Arc::new(email),
            google: Arc::new(google),
            paypal: paypal.map(Arc::new),
        }
    }

    /// State over a temp directory with the outbox email transport and no
    /// PayPal client.
    #[cfg(test)]
    pub fn for_tests() -> (Self, tempfile::TempDir) {
        use crate::storage::StoragePaths;

        let temp_dir = tempfile::TempDir::new().expect("tempdir");
        let paths = StoragePaths::new(temp_dir.path());
        let store = JsonStore::new(paths.clone());
        store.initialize().expect("initialize storage");

        let config = AppConfig::default();
        let email = EmailSender::from_config(&config, &paths);
        let google = GoogleVerifier::new(None);

        (Self::new(store, config, email, google, None), temp_dir)
    }
}
