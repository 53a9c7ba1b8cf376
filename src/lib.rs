pub mod database;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
#[cfg(test)]
pub mod test_utils;

use anyhow::Context;
use log::info;
use tokio::{net::TcpListener, signal};

use services::config::AppConfig;
use state::AppState;

/// Load configuration, open the database and serve until Ctrl+C / SIGTERM.
pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    let address = format!("0.0.0.0:{}", config.port);

    info!("Initializing state...");
    let state = AppState::init(config).await?;
    info!(
        "STL extraction: layout={}, {} allow-listed meshes",
        state.config.stl.layout,
        state.stl.allow_list().names().len()
    );

    let app = routes::router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
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
