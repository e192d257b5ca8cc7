//! Auth Gateway
//!
//! Entry point for the gateway host. Serves gated proxy routes on the
//! public listener and metrics plus cache administration on the admin
//! listener.

use auth_gateway::auth::AuthGate;
use auth_gateway::config::Config;
use auth_gateway::observability::metrics::init_metrics_recorder;
use auth_gateway::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Auth Gateway");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        admin_bind_address = %config.admin_bind_address,
        api_key_flow = config.verify_api_key_url.is_some(),
        api_key_cache = config.api_key_cache_enabled,
        jwt_algorithm = ?config.jwt_algorithm,
        products = config.product_to_proxy.len(),
        "Configuration loaded successfully"
    );

    if config.allow_no_authorization || config.allow_invalid_authorization {
        warn!(
            target: "auth_gateway.auth.security",
            allow_no_authorization = config.allow_no_authorization,
            allow_invalid_authorization = config.allow_invalid_authorization,
            "Gate configured to let unauthenticated requests through"
        );
    }

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let gate = AuthGate::from_config(&config).map_err(|e| {
        error!("Failed to build auth gate: {}", e);
        e
    })?;

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;
    let admin_addr: SocketAddr = config.admin_bind_address.parse().map_err(|e| {
        error!("Invalid admin bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState {
        config,
        gate: Arc::new(gate),
    });

    let app = routes::build_routes(state.clone());
    let admin_app = routes::build_admin_routes(state, metrics_handle);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let admin_listener = tokio::net::TcpListener::bind(admin_addr).await?;
    info!("Admin endpoints listening on {}", admin_addr);
    let mut admin_shutdown = shutdown_rx.clone();
    let admin_server = tokio::spawn(async move {
        axum::serve(admin_listener, admin_app)
            .with_graceful_shutdown(async move {
                let _ = admin_shutdown.changed().await;
            })
            .await
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Auth Gateway listening on {}", addr);
    let mut public_shutdown = shutdown_rx;
    let public_server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = public_shutdown.changed().await;
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    public_server.await?;
    admin_server.await??;

    info!("Auth Gateway shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and the drain period is over.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    let drain_secs: u64 = std::env::var("GW_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    }
}
