//! Discord bot client.
//!
//! Owns the serenity client, forwards gateway events into a channel and
//! drives the relay from a single event loop.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bridge::Relay;
use crate::common::ChatEvent;
use crate::config::Config;
use crate::discord::outlet::{chat_event_from_message, SerenityOutlet};
use crate::protocol::rcon::RconConnector;

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready { context: Context, ready: Ready },
    /// Message received.
    Message { context: Context, message: Message },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready { context, ready });
    }

    async fn message(&self, context: Context, message: Message) {
        self.forward(DiscordBotEvent::Message { context, message });
    }
}

async fn build_client(
    token: &str,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(Duration::from_secs(5 * 60))
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    config: Config,
    rcon: Arc<dyn RconConnector>,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
    console_rx: mpsc::UnboundedReceiver<String>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    /// Build the serenity client. Nothing connects until [`DiscordBot::run`].
    pub async fn build(
        config: Config,
        rcon: Arc<dyn RconConnector>,
        console_rx: mpsc::UnboundedReceiver<String>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<Self> {
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();
        let client = build_client(&config.discord_token, discord_events_tx.clone()).await?;

        Ok(Self {
            client: Some(client),
            token: config.discord_token.clone(),
            config,
            rcon,
            discord_events_rx,
            discord_events_tx,
            console_rx,
            shutdown_rx,
        })
    }

    pub async fn run(mut self) {
        let shard_manager = self.client.as_ref().map(|c| c.shard_manager.clone());
        let shutdown_rx = &mut self.shutdown_rx;
        let mut loop_ctx = EventLoop {
            config: &self.config,
            rcon: &self.rcon,
            discord_events_rx: &mut self.discord_events_rx,
            console_rx: &mut self.console_rx,
        };

        // Only this branch watches for shutdown, so the gateway is always
        // closed through the shard manager.
        tokio::select! {
            _ = Self::run_connection(&mut self.client, &self.token, &self.discord_events_tx) => {},
            _ = loop_ctx.process_events() => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        client: &mut Option<Client>,
        token: &str,
        discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>,
    ) {
        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => {
                    // serenity mostly handles reconnections itself.
                    match build_client(token, discord_events_tx.clone()).await {
                        Ok(client) => {
                            backoff = discord_backoff();
                            client
                        }
                        Err(e) => {
                            error!("Failed to rebuild Discord client: {}", e);
                            let delay = backoff.next().unwrap_or(Duration::from_secs(5 * 60));
                            warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                            sleep(delay).await;
                            continue;
                        }
                    }
                }
            };

            let result = client.start().await;
            if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                warn!("Failed to process discord event: {}", error);
            }

            match result {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(5 * 60));
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Borrowed state for the event loop.
struct EventLoop<'a> {
    config: &'a Config,
    rcon: &'a Arc<dyn RconConnector>,
    discord_events_rx: &'a mut mpsc::UnboundedReceiver<DiscordBotEvent>,
    console_rx: &'a mut mpsc::UnboundedReceiver<String>,
}

impl EventLoop<'_> {
    /// Each event is dispatched on its own task so a slow RCON session or
    /// Discord call never holds up the next one.
    async fn process_events(&mut self) {
        let mut relay: Option<Arc<Relay>> = None;

        loop {
            tokio::select! {
                event = self.discord_events_rx.recv() => {
                    match event {
                        Some(DiscordBotEvent::Ready { context, ready }) => {
                            info!("Discord bot connected as {}", ready.user.name);
                            match self.build_relay(context) {
                                Ok(built) => relay = Some(Arc::new(built)),
                                Err(e) => {
                                    error!("Failed to start relay: {}", e);
                                    return;
                                }
                            }
                        }
                        Some(DiscordBotEvent::Message { context, message }) => {
                            if let Some(relay) = relay.clone() {
                                tokio::spawn(async move {
                                    let event = chat_event_from_message(&context, &message).await;
                                    relay.dispatch(event).await;
                                });
                            }
                        }
                        Some(DiscordBotEvent::Disconnected) => {
                            relay = None;
                        }
                        None => {
                            debug!("Discord events channel closed.");
                            break;
                        }
                    }
                }

                // Minecraft -> Discord (drop if not connected)
                line = self.console_rx.recv() => {
                    match line {
                        Some(line) => {
                            if let Some(relay) = relay.clone() {
                                tokio::spawn(async move {
                                    relay.dispatch(ChatEvent::console_line(line)).await;
                                });
                            } else {
                                debug!("Dropping console line - Discord not connected");
                            }
                        }
                        None => {
                            warn!("Console input channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn build_relay(&self, context: Context) -> anyhow::Result<Relay> {
        let outlet = SerenityOutlet::new(context)?;
        Ok(Relay::new(self.config, Arc::new(outlet), self.rcon.clone())?)
    }
}
