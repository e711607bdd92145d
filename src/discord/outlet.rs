//! Outbound Discord operations used by the relay.
//!
//! [`DiscordOutlet`] is the seam between the relay and serenity; the relay
//! never touches the gateway client directly.

use std::time::Duration;

use async_trait::async_trait;
use serenity::cache::Cache;
use serenity::model::channel::{ChannelType, Message};
use serenity::model::id::ChannelId;
use serenity::model::user::User;
use serenity::prelude::Context;
use tracing::debug;

use crate::common::error::{ConfigError, DiscordError, RelayResult};
use crate::common::{Author, ChannelInfo, ChatEvent, RosterEntry, UserRoster, WebhookPayload};

/// What the relay needs from Discord.
#[async_trait]
pub trait DiscordOutlet: Send + Sync {
    /// ID of the bot account, once known.
    fn bot_user_id(&self) -> Option<u64>;

    /// Snapshot of known users for mention lookup.
    fn roster(&self) -> UserRoster;

    /// Send to a text channel. A missing or non-text channel is a
    /// configuration error.
    async fn send_to_channel(&self, channel_id: u64, content: &str) -> RelayResult<()>;

    /// POST a webhook execution.
    async fn post_webhook(&self, url: &str, payload: &WebhookPayload) -> RelayResult<()>;
}

/// [`DiscordOutlet`] backed by a live serenity context.
#[derive(Clone)]
pub struct SerenityOutlet {
    ctx: Context,
    http_client: reqwest::Client,
}

impl SerenityOutlet {
    pub fn new(ctx: Context) -> Result<Self, DiscordError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { ctx, http_client })
    }
}

#[async_trait]
impl DiscordOutlet for SerenityOutlet {
    fn bot_user_id(&self) -> Option<u64> {
        Some(self.ctx.cache.current_user().id.get())
    }

    fn roster(&self) -> UserRoster {
        roster_from_cache(&self.ctx.cache)
    }

    async fn send_to_channel(&self, channel_id: u64, content: &str) -> RelayResult<()> {
        if channel_id == 0 {
            return Err(ConfigError::ChannelNotFound { channel_id }.into());
        }

        let channel = ChannelId::new(channel_id)
            .to_channel(&self.ctx)
            .await
            .map_err(|e| {
                debug!("Channel lookup failed: {}", e);
                ConfigError::ChannelNotFound { channel_id }
            })?;

        let text_channel = channel
            .guild()
            .filter(|channel| channel.kind == ChannelType::Text)
            .ok_or(ConfigError::NotTextChannel { channel_id })?;

        text_channel
            .id
            .say(&self.ctx.http, content)
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }

    async fn post_webhook(&self, url: &str, payload: &WebhookPayload) -> RelayResult<()> {
        self.http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(DiscordError::from)?;
        Ok(())
    }
}

/// Every cached guild member, guild by guild.
fn roster_from_cache(cache: &Cache) -> UserRoster {
    cache
        .guilds()
        .iter()
        .filter_map(|guild_id| cache.guild(*guild_id))
        .flat_map(|guild| {
            guild
                .members
                .values()
                .map(|member| roster_entry(&member.user))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn roster_entry(user: &User) -> RosterEntry {
    RosterEntry {
        id: user.id.get(),
        username: user.name.clone(),
        discriminator: discriminator_of(user),
    }
}

/// Four-digit discriminator, or "0" for accounts on unique usernames.
fn discriminator_of(user: &User) -> String {
    user.discriminator
        .map(|d| format!("{:04}", d.get()))
        .unwrap_or_else(|| "0".to_string())
}

/// Convert a gateway message into a relay event.
pub async fn chat_event_from_message(ctx: &Context, msg: &Message) -> ChatEvent {
    let is_text = match msg.channel_id.to_channel(ctx).await {
        Ok(channel) => channel
            .guild()
            .is_some_and(|channel| channel.kind == ChannelType::Text),
        Err(e) => {
            debug!("Could not resolve channel {}: {}", msg.channel_id, e);
            false
        }
    };

    let author = Author {
        name: msg.author.name.clone(),
        discriminator: Some(discriminator_of(&msg.author)),
        id: Some(msg.author.id.get()),
    };

    let channel = ChannelInfo {
        channel_id: msg.channel_id.get(),
        is_text,
        webhook_id: msg.webhook_id.map(|id| id.get()),
    };

    ChatEvent::discord_message(
        msg.content.clone(),
        msg.content_safe(&ctx.cache),
        author,
        channel,
        !msg.attachments.is_empty(),
    )
}
