//! Canonical message types for relay communication.
//!
//! Every value here is scoped to a single relay operation and dropped once
//! the event has been dispatched.

use serde::Serialize;

/// Which side of the bridge an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSource {
    Minecraft,
    Discord,
}

/// Author of a chat event.
///
/// Console lines have no author until parsed, so every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    /// Username (Discord username, not nickname).
    pub name: String,
    /// Four-digit Discord discriminator ("0" for migrated accounts).
    pub discriminator: Option<String>,
    /// Discord user ID.
    pub id: Option<u64>,
}

/// Discord channel facts the relay filter needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: u64,
    /// Whether the channel is a plain guild text channel.
    pub is_text: bool,
    /// ID of the webhook that posted the message, if any.
    pub webhook_id: Option<u64>,
}

/// One incoming line or message.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub source: ChatSource,
    /// Text exactly as received (console line, or raw Discord content).
    pub raw_text: String,
    /// Display-safe text: mentions rendered as names. Equals `raw_text` for
    /// console lines.
    pub clean_text: String,
    pub author: Author,
    pub has_attachment: bool,
    /// Present for Discord events only.
    pub channel: Option<ChannelInfo>,
}

impl ChatEvent {
    /// Wrap a raw console line (or webhook body) from Minecraft.
    pub fn console_line(line: impl Into<String>) -> Self {
        let raw_text = line.into();
        Self {
            source: ChatSource::Minecraft,
            clean_text: raw_text.clone(),
            raw_text,
            author: Author::default(),
            has_attachment: false,
            channel: None,
        }
    }

    /// Build an event for a Discord channel message.
    pub fn discord_message(
        raw_text: impl Into<String>,
        clean_text: impl Into<String>,
        author: Author,
        channel: ChannelInfo,
        has_attachment: bool,
    ) -> Self {
        Self {
            source: ChatSource::Discord,
            raw_text: raw_text.into(),
            clean_text: clean_text.into(),
            author,
            has_attachment,
            channel: Some(channel),
        }
    }
}

/// A known Discord user, used for mention lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: u64,
    pub username: String,
    pub discriminator: String,
}

/// Ordered snapshot of known Discord users.
pub type UserRoster = Vec<RosterEntry>;

/// JSON body for a Discord webhook execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub content: String,
    pub avatar_url: String,
}

/// Output of rendering a Minecraft chat line for Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedMessage {
    /// Formatted text for a direct channel send.
    Text(String),
    /// Structured payload for a webhook POST.
    Webhook(WebhookPayload),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_line_defaults() {
        let event = ChatEvent::console_line("[Server thread/INFO]: <Bob> hi");
        assert_eq!(event.source, ChatSource::Minecraft);
        assert_eq!(event.raw_text, event.clean_text);
        assert!(event.channel.is_none());
        assert!(!event.has_attachment);
    }

    #[test]
    fn test_webhook_payload_field_names() {
        let payload = WebhookPayload {
            username: "Bob".to_string(),
            content: "hi".to_string(),
            avatar_url: "https://minotar.net/helm/Bob/256.png".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["username"], "Bob");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["avatar_url"], "https://minotar.net/helm/Bob/256.png");
    }
}
