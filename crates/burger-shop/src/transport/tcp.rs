//! TCP server: wires the ledger, kitchen and supervisor together.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::allocation::{Ledger, LedgerSnapshot};
use crate::config::ShopConfig;
use crate::kitchen::{ChefReport, Kitchen};
use crate::supervisor::{SessionSupervisor, SupervisorReport};

pub const DEFAULT_PORT: u16 = 54321;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Everything that happened between opening and closing the shop.
#[derive(Debug, Clone, Serialize)]
pub struct ServeReport {
    pub ledger: LedgerSnapshot,
    pub chefs: Vec<ChefReport>,
    pub supervisor: SupervisorReport,
}

/// Bind, open the shop, and run until it sells out or a signal arrives.
pub async fn serve(config: ServerConfig, shop: ShopConfig) -> anyhow::Result<ServeReport> {
    let listener = bind(&config).await?;

    let shutdown = CancellationToken::new();
    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let report = serve_listener(listener, shop, shutdown).await;
    signal_task.abort();
    report
}

/// Bind the configured address. Host names are resolved.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))
}

/// Run the shop on an already-bound listener.
///
/// Returns once every session has finished. Cancelling `shutdown` closes the
/// shop early: waiting customers are told `SOLD_OUT` and chefs go home.
pub async fn serve_listener(
    listener: TcpListener,
    shop: ShopConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<ServeReport> {
    shop.validate()?;

    let actual_addr = listener.local_addr()?;
    info!(
        addr = %actual_addr,
        capacity = shop.capacity,
        chefs = shop.num_producers,
        quota = shop.request_quota,
        "Burger shop listening"
    );

    let mut ledger = Ledger::new(shop.capacity);
    if let Some(timeout) = shop.wake_timeout {
        ledger = ledger.with_wake_timeout(timeout);
    }
    let ledger = Arc::new(ledger);

    let kitchen_shutdown = shutdown.child_token();
    let kitchen = Kitchen::new(
        Arc::clone(&ledger),
        shop.num_producers,
        shop.prep_pacing.clone(),
    )
    .spawn(kitchen_shutdown.clone());

    let supervisor = SessionSupervisor::new(Arc::clone(&ledger), shop.session_config());
    let supervisor_report = supervisor.run(listener, shutdown).await;

    // Chefs have normally finished by now; release any still waiting out a prep delay.
    kitchen_shutdown.cancel();
    let chefs = kitchen.join().await;

    info!("Server shutdown complete");

    Ok(ServeReport {
        ledger: ledger.snapshot(),
        chefs,
        supervisor: supervisor_report,
    })
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed, which only happens when the
/// tokio runtime is misconfigured. That is an unrecoverable startup error.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler - is tokio runtime configured correctly?");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler - is tokio runtime configured correctly?")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 54321);
    }

    #[tokio::test]
    async fn binds_by_host_name() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
        };
        let listener = bind(&config).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn invalid_shop_config_fails_before_opening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shop = ShopConfig {
            num_producers: 0,
            ..ShopConfig::instant(5, 1)
        };

        let err = serve_listener(listener, shop, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "at least one chef is required");
    }

    #[tokio::test]
    async fn cancelled_shop_closes_without_customers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let report = serve_listener(listener, ShopConfig::instant(5, 2), shutdown)
            .await
            .unwrap();

        assert_eq!(report.ledger.state, crate::allocation::RunState::Stopped);
        assert_eq!(report.ledger.claimed, 0);
        assert!(report.supervisor.sessions.is_empty());
        assert_eq!(report.chefs.len(), 2);
    }
}
