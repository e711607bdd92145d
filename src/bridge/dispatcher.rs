//! Relay dispatcher that ties Minecraft and Discord together.
//!
//! Minecraft -> Discord: parse the console line, render it, then send it to
//! the channel or post it through the webhook.
//!
//! Discord -> Minecraft: filter the message, build a `tellraw` command (or the
//! raw admin command), and run it over a fresh RCON session.
//!
//! Every event is handled once. Failures are logged and the event is dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::bridge::chat::{ChatLineParser, ParseOutcome, ParsedChat};
use crate::bridge::formatter::{MessageTemplate, TemplateVars};
use crate::bridge::sanitize::{escape_json_string, strip_emoji};
use crate::common::error::{ConfigError, RelayError, RelayResult};
use crate::common::{ChatEvent, ChatSource, RenderedMessage, UserRoster, WebhookPayload};
use crate::config::Config;
use crate::discord::outlet::DiscordOutlet;
use crate::discord::resolver::MentionResolver;
use crate::protocol::rcon::{self, RconConnector};

/// Why a Discord message was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WrongChannel,
    NotTextChannel,
    OwnMessage,
    OwnWebhook,
    Attachment,
}

/// Result of handling one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinecraftOutcome {
    Ignored,
    Sent(RenderedMessage),
}

/// Result of handling one Discord message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordOutcome {
    Skipped(SkipReason),
    /// Command sent over RCON, with the server's reply.
    Sent { command: String, response: String },
}

/// Bidirectional relay.
pub struct Relay {
    config: Config,
    parser: ChatLineParser,
    discord_template: MessageTemplate,
    tellraw_template: MessageTemplate,
    avatar_template: MessageTemplate,
    mentions: MentionResolver,
    own_webhook_id: Option<u64>,
    discord: Arc<dyn DiscordOutlet>,
    rcon: Arc<dyn RconConnector>,
}

impl Relay {
    pub fn new(
        config: &Config,
        discord: Arc<dyn DiscordOutlet>,
        rcon: Arc<dyn RconConnector>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            parser: ChatLineParser::from_config(config)?,
            discord_template: MessageTemplate::new(config.discord_message_template.clone()),
            tellraw_template: MessageTemplate::new(config.minecraft_tellraw_template.clone()),
            avatar_template: MessageTemplate::new(config.webhook_avatar_url_template.clone()),
            mentions: MentionResolver::new(config.allow_user_mentions),
            own_webhook_id: config.webhook_id(),
            config: config.clone(),
            discord,
            rcon,
        })
    }

    /// Handle one event, logging any failure.
    pub async fn dispatch(&self, event: ChatEvent) {
        match event.source {
            ChatSource::Minecraft => match self.relay_to_discord(&event.raw_text).await {
                Ok(MinecraftOutcome::Ignored) => debug!("Ignored console line"),
                Ok(MinecraftOutcome::Sent(_)) => {}
                Err(RelayError::Parse(e)) => warn!("Dropping console line: {}", e),
                Err(RelayError::Config(e)) => error!("Cannot relay to Discord: {}", e),
                Err(e) => error!("Minecraft -> Discord failed: {}", e),
            },
            ChatSource::Discord => match self.relay_to_minecraft(&event).await {
                Ok(DiscordOutcome::Skipped(reason)) => debug!("Skipped Discord message: {:?}", reason),
                Ok(DiscordOutcome::Sent { .. }) => {}
                Err(e) => error!("Discord -> Minecraft failed: {}", e),
            },
        }
    }

    /// Minecraft -> Discord for one console line.
    pub async fn relay_to_discord(&self, line: &str) -> RelayResult<MinecraftOutcome> {
        info!("Received {}", line);

        let chat = match self.parser.parse(line)? {
            ParseOutcome::Ignored => return Ok(MinecraftOutcome::Ignored),
            ParseOutcome::Chat(chat) => chat,
        };
        debug!("Username: {}", chat.username);
        debug!("Text: {}", chat.message);

        let rendered = self.render_for_discord(&chat, &self.discord.roster());
        match &rendered {
            RenderedMessage::Webhook(payload) => {
                self.discord
                    .post_webhook(&self.config.webhook_url, payload)
                    .await?;
            }
            RenderedMessage::Text(content) => {
                self.discord
                    .send_to_channel(self.config.discord_channel_id.get(), content)
                    .await?;
            }
        }

        info!("Minecraft -> Discord: <{}> {}", chat.username, chat.message);
        Ok(MinecraftOutcome::Sent(rendered))
    }

    /// Build the Discord-side message for a parsed chat line.
    pub fn render_for_discord(&self, chat: &ParsedChat, roster: &UserRoster) -> RenderedMessage {
        let message = self.mentions.resolve(&chat.message, roster);

        if self.config.use_webhooks {
            let avatar_vars = TemplateVars::new().with_username(chat.username.as_str());
            RenderedMessage::Webhook(WebhookPayload {
                username: chat.username.clone(),
                content: message,
                avatar_url: self.avatar_template.render(&avatar_vars),
            })
        } else {
            let vars = TemplateVars::new()
                .with_username(chat.username.as_str())
                .with_message(message);
            RenderedMessage::Text(self.discord_template.render(&vars))
        }
    }

    /// Discord -> Minecraft for one channel message.
    pub async fn relay_to_minecraft(&self, event: &ChatEvent) -> RelayResult<DiscordOutcome> {
        if let Err(reason) = self.should_relay(event) {
            return Ok(DiscordOutcome::Skipped(reason));
        }

        let command = self.build_command(event);
        let response = rcon::run_command(
            self.rcon.as_ref(),
            &self.config.rcon_password,
            &command,
            Duration::from_secs(self.config.rcon_timeout_secs),
        )
        .await?;

        info!("Discord -> Minecraft: {}", command);
        Ok(DiscordOutcome::Sent { command, response })
    }

    /// Decide whether a Discord message is relayed.
    pub fn should_relay(&self, event: &ChatEvent) -> Result<(), SkipReason> {
        let channel = event.channel.unwrap_or_default();

        if channel.channel_id != self.config.discord_channel_id.get() {
            return Err(SkipReason::WrongChannel);
        }
        if !channel.is_text {
            return Err(SkipReason::NotTextChannel);
        }
        if self.config.use_webhooks {
            if let Some(webhook_id) = channel.webhook_id {
                // Without a parsable WEBHOOK_URL every webhook post counts as ours
                if self.own_webhook_id.is_none_or(|own| own == webhook_id) {
                    return Err(SkipReason::OwnWebhook);
                }
            }
        }
        if event.author.id.is_some() && event.author.id == self.discord.bot_user_id() {
            return Err(SkipReason::OwnMessage);
        }
        if event.has_attachment {
            return Err(SkipReason::Attachment);
        }

        Ok(())
    }

    /// The RCON command for a relayed message.
    ///
    /// Admins using the prefix get their text passed through verbatim.
    /// Everyone else is rendered into a `tellraw @a` broadcast.
    pub fn build_command(&self, event: &ChatEvent) -> String {
        if let Some(raw) = self.admin_command(event) {
            info!("Admin command from {}: {}", event.author.name, raw);
            return raw.to_string();
        }

        let discriminator = event.author.discriminator.as_deref().unwrap_or_default();
        let vars = TemplateVars::new()
            .with_username(escape_json_string(&strip_emoji(&event.author.name)))
            .with_discriminator(escape_json_string(discriminator))
            .with_message(escape_json_string(&strip_emoji(&event.clean_text)));

        format!("tellraw @a {}", self.tellraw_template.render(&vars))
    }

    fn admin_command<'a>(&self, event: &'a ChatEvent) -> Option<&'a str> {
        let author_id = event.author.id?;
        if !self.config.is_admin(author_id) {
            return None;
        }
        event.raw_text.strip_prefix(self.config.prefix.as_str())
    }
}
