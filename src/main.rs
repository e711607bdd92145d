//! mcrelay - Minecraft-Discord chat bridge
//!
//! Relays chat lines from a Minecraft server console to a Discord channel and
//! Discord channel messages back into the game over RCON.

mod bridge;
mod common;
mod config;
mod console;
mod discord;
mod protocol;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter};

use config::{env::get_config_path, load_and_validate};
use console::InputSource;
use discord::DiscordBot;
use protocol::rcon::TcpRconConnector;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!("mcrelay v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        error!("See config.example.json for reference.");
        e
    })?;

    if config.debug {
        let raised = filter_handle.modify(|filter| {
            *filter = EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into());
        });
        if let Err(e) = raised {
            warn!("Failed to enable debug logging: {}", e);
        }
        debug!("Debug logging enabled");
    }

    // A missing log file is fatal
    let source = InputSource::from_config(&config).map_err(|e| {
        error!("Failed to set up console input: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Console input: {}", source);
    info!("  Discord channel: {}", config.discord_channel_id);
    if config.use_webhooks {
        info!("  Relay mode: webhook");
    } else {
        info!("  Relay mode: channel message");
    }
    info!("  RCON: {}:{}", config.rcon_host, config.rcon_port);
    info!("  User mentions: {}", config.allow_user_mentions);
    info!("  Admins: {}", config.admins.len());

    // ============================================================
    // Create channels for communication
    // ============================================================

    // Console -> Discord
    let (console_tx, console_rx) = mpsc::unbounded_channel::<String>();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ============================================================
    // Spawn tasks
    // ============================================================

    let mut source_task = tokio::spawn(source.run(console_tx));

    let rcon = Arc::new(TcpRconConnector::new(config.rcon_host.clone(), config.rcon_port));
    let discord_bot = DiscordBot::build(config, rcon, console_rx, shutdown_rx).await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(async move {
        discord_bot.run().await;
    });

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping...");
            true
        }
        result = &mut source_task => {
            match result {
                Ok(Ok(())) => info!("Console input task ended"),
                Ok(Err(e)) => {
                    error!("Console input failed: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("Console input task panicked: {}", e);
                    return Err(anyhow!("console input task panicked: {}", e));
                }
            }
            false
        }
        _ = &mut discord_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (Discord task already exited): {}", e);
        }
        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, discord_task).await {
            Ok(Ok(())) => info!("Discord client stopped gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }
    source_task.abort();

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
