use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use waylo_notification_service::config::Settings;
use waylo_notification_service::server::{create_app, AppState};
use waylo_notification_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;

    let _telemetry = init_telemetry(&settings.otel, &settings.log)?;
    tracing::info!("Configuration loaded");

    let addr = settings.server_addr();
    let state = AppState::new(settings);
    tracing::info!(store = state.store.backend(), "Application state initialized");

    let app = create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
