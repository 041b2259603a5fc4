//! Notification relay server binary entrypoint.

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use relay_common::ACTIVITY_TARGET;
use relay_common::config::RelayConfig;
use relay_common::db::create_pool;
use relay_notifier::{Forwarder, ForwarderConfig};
use relay_store::NotificationStore;

use relay_api::routes::create_router;
use relay_api::state::AppState;
use relay_api::telemetry;

/// Notifications are short; anything larger is rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing and the activity log
    telemetry::init(&config.log_file)?;

    tracing::info!(target: ACTIVITY_TARGET, "=== Relay starting ===");

    // Open the store and apply migrations
    let pool = create_pool(&config.database_path, config.db_max_connections).await?;
    let store = NotificationStore::new(pool);
    store.migrate().await?;
    tracing::info!(
        target: ACTIVITY_TARGET,
        "Database initialized at {}",
        config.database_path.display()
    );

    let forwarder = Forwarder::new(ForwarderConfig::from(&config))?;
    tracing::info!(endpoint = %forwarder.config().endpoint, "Agent forwarder ready");

    let addr = config.listen_addr()?;

    // Build application state
    let state = AppState::new(store.clone(), forwarder);

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: ACTIVITY_TARGET, "Relay listening on http://{}", addr);
    tracing::info!(target: ACTIVITY_TARGET, "Endpoints:");
    tracing::info!(target: ACTIVITY_TARGET, "  POST /notify - Send notification {{source, title, message, priority}}");
    tracing::info!(target: ACTIVITY_TARGET, "  POST /done/<id> - Mark notification done {{response}}");
    tracing::info!(target: ACTIVITY_TARGET, "  GET /pending - List pending notifications");
    tracing::info!(target: ACTIVITY_TARGET, "  GET /history - Recent notifications");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(target: ACTIVITY_TARGET, "Shutting down");
    store.pool().close().await;

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
