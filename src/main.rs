//! ChatHub Server: real-time delivery hub for chat messages and notifications.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use chathub_api::{AppState, build_router};
use chathub_auth::JwtDecoder;
use chathub_core::config::AppConfig;
use chathub_core::error::{AppError, ErrorKind};
use chathub_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("CHATHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ChatHub v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret == AppConfig::default().auth.jwt_secret {
        tracing::warn!("Using the default JWT secret; set CHATHUB__AUTH__JWT_SECRET");
    }
    if config.auth.internal_token.is_none() {
        tracing::warn!("Internal publish endpoint is unauthenticated");
    }

    let addr = config.server.bind_address();
    let grace = std::time::Duration::from_secs(config.server.shutdown_grace_seconds);

    let tokens = Arc::new(JwtDecoder::new(&config.auth));
    let realtime = RealtimeEngine::new(config.realtime.clone());
    let state = AppState::new(config, realtime.clone(), tokens);
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Transport, format!("Failed to bind {addr}"), e))?;
    tracing::info!("ChatHub server listening on {}", addr);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let engine = realtime.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Close every queue first so sessions send close frames while
            // the listener drains.
            engine.shutdown().await;
        })
        .await?;

    sessions.close();
    if timeout(grace, sessions.wait()).await.is_err() {
        tracing::warn!(
            remaining = sessions.len(),
            "Sessions still open after shutdown grace period"
        );
    }

    tracing::info!("ChatHub server shut down gracefully");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    token.cancel();
}
