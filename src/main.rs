// SPDX-License-Identifier: AGPL-3.0-or-later

use arcade_server::{
    api::router,
    config::AppConfig,
    providers::{EmailSender, GoogleVerifier, PayPalClient},
    state::AppState,
    storage::{JsonStore, StoragePaths},
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = AppConfig::from_env();
    tracing::info!(port = config.port, "Starting arcade server");

    let paths = StoragePaths::new(&config.data_dir);
    let store = JsonStore::new(paths.clone());
    store.initialize()?;
    store.health_check()?;
    tracing::info!(data_dir = %config.data_dir.display(), "Storage initialized");

    let email = EmailSender::from_config(&config, &paths);
    let google = GoogleVerifier::new(config.google_client_id.clone());

    let paypal = PayPalClient::from_config(&config)?;
    match &paypal {
        Some(client) => tracing::info!(currency = client.currency(), "PayPal checkout enabled"),
        None => tracing::warn!("PayPal not configured; payment routes will return 503"),
    }

    let addr = config.bind_addr();
    let state = AppState::new(store, config, email, google, paypal);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Structured logging: JSON when `LOG_FORMAT=json`, human-readable otherwise.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
