//! Serve command - accept scheduler invocations over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tracing::{info, warn};

use oddjob_core::Config;

use crate::api::create_router;
use crate::state::AppState;

/// Arguments for the serve command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port).
    #[arg(long)]
    pub port: Option<u16>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: &Config) -> Result<()> {
    let state = AppState::from_config(config);

    let platforms = state.platforms();
    if platforms.is_empty() {
        warn!("No platform credentials configured, every invocation will be rejected");
    } else {
        let names: Vec<_> = platforms.iter().map(|p| p.as_str()).collect();
        info!("Accepting bookings for: {}", names.join(", "));
    }

    let app = create_router(Arc::new(state));

    let port = args.port.unwrap_or(config.server.port);
    let addr = SocketAddr::new(config.server.host, port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
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

    info!("Shutdown signal received");
}
