use anyhow::Result;
use pv_switcher::config::Config;
use pv_switcher::engine::Switcher;
use pv_switcher::logging::init_logging;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_logging(&config.logging, config.debug)?;

    info!("PV switcher {} starting up", env!("APP_VERSION"));

    // Listen before opening the relay so an early signal still disengages
    let token = CancellationToken::new();
    tokio::spawn(cancel_on_signal(token.clone()));

    let mut switcher = Switcher::from_config(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create switcher: {}", e))?;

    switcher.run(token).await;
    info!("Exiting");
    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
                    _ = sigterm.recv() => info!("SIGTERM received"),
                }
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Cannot listen for SIGINT: {}", e);
                    return;
                }
                info!("SIGINT received");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received");
    }
    token.cancel();
}
