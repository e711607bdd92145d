//! Configuration type definitions.
//!
//! Keys use the SCREAMING_SNAKE_CASE names of the JSON config file.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Default chat-line pattern for vanilla server logs.
pub const DEFAULT_MATCH_CHAT: &str = r"\[Server thread/INFO\]: <(.*)> (.*)";

/// Default ignore pattern (rate-limit kick notices).
pub const DEFAULT_IGNORED_CHAT: &str = "packets too frequently";

/// Default escape-sequence pattern.
pub const DEFAULT_ANSI_CODE: &str = r"\x1b\[[0-9;]*m";

pub const DEFAULT_DISCORD_TEMPLATE: &str = "`%username%`: %message%";

pub const DEFAULT_TELLRAW_TEMPLATE: &str =
    r#"[{"color": "white", "text": "<%username%> %message%"}]"#;

pub const DEFAULT_AVATAR_TEMPLATE: &str = "https://minotar.net/helm/%username%/256.png";

/// A Discord ID, accepted as a JSON string or number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(Self(id)),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("'{}' is not a Discord ID", text))),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Tail a local log file instead of receiving webhook pushes.
    #[serde(default)]
    pub is_local_file: bool,
    #[serde(default)]
    pub local_file_path: String,
    /// Port for the webhook receiver.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the webhook receiver listens on.
    #[serde(default = "default_webhook_path")]
    pub webhook: String,

    /// Post to Discord through a webhook instead of the bot account.
    #[serde(default)]
    pub use_webhooks: bool,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_avatar_template")]
    pub webhook_avatar_url_template: String,

    pub discord_token: String,
    pub discord_channel_id: Snowflake,
    #[serde(default)]
    pub allow_user_mentions: bool,
    #[serde(default = "default_discord_template")]
    pub discord_message_template: String,
    #[serde(default = "default_tellraw_template")]
    pub minecraft_tellraw_template: String,

    #[serde(default = "default_match_chat", rename = "REGEX_MATCH_CHAT_MC")]
    pub regex_match_chat_mc: String,
    #[serde(default = "default_ignored_chat")]
    pub regex_ignored_chat: String,
    #[serde(default = "default_ansi_code", rename = "REGEX_ASNI_CODE")]
    pub regex_ansi_code: String,

    #[serde(rename = "MINECRAFT_SERVER_RCON_IP")]
    pub rcon_host: String,
    #[serde(default = "default_rcon_port", rename = "MINECRAFT_SERVER_RCON_PORT")]
    pub rcon_port: u16,
    #[serde(default, rename = "MINECRAFT_SERVER_RCON_PASSWORD")]
    pub rcon_password: String,
    /// Upper bound for one connect/authenticate/command/close sequence.
    #[serde(default = "default_rcon_timeout")]
    pub rcon_timeout_secs: u64,

    /// Discord user IDs allowed to send raw console commands.
    #[serde(default)]
    pub admins: Vec<Snowflake>,
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub debug: bool,
}

impl Config {
    /// Whether the given Discord user may issue raw console commands.
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admins.iter().any(|admin| admin.get() == user_id)
    }

    /// Webhook ID embedded in `WEBHOOK_URL` (`.../api/webhooks/<id>/<token>`).
    pub fn webhook_id(&self) -> Option<u64> {
        let mut segments = self.webhook_url.split('/');
        segments.find(|segment| *segment == "webhooks")?;
        segments.next()?.parse().ok()
    }
}

fn default_port() -> u16 {
    8000
}

fn default_webhook_path() -> String {
    "/minecraft/hook".to_string()
}

fn default_avatar_template() -> String {
    DEFAULT_AVATAR_TEMPLATE.to_string()
}

fn default_discord_template() -> String {
    DEFAULT_DISCORD_TEMPLATE.to_string()
}

fn default_tellraw_template() -> String {
    DEFAULT_TELLRAW_TEMPLATE.to_string()
}

fn default_match_chat() -> String {
    DEFAULT_MATCH_CHAT.to_string()
}

fn default_ignored_chat() -> String {
    DEFAULT_IGNORED_CHAT.to_string()
}

fn default_ansi_code() -> String {
    DEFAULT_ANSI_CODE.to_string()
}

fn default_rcon_port() -> u16 {
    25575
}

fn default_rcon_timeout() -> u64 {
    10
}

fn default_prefix() -> String {
    "!".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_from_string_or_number() {
        let a: Snowflake = serde_json::from_str(r#""1234567890""#).unwrap();
        let b: Snowflake = serde_json::from_str("1234567890").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Snowflake>(r#""general""#).is_err());
    }

    #[test]
    fn test_webhook_id_from_url() {
        let config: Config = serde_json::from_str(
            r#"{
                "DISCORD_TOKEN": "t",
                "DISCORD_CHANNEL_ID": "1",
                "MINECRAFT_SERVER_RCON_IP": "127.0.0.1",
                "WEBHOOK_URL": "https://discord.com/api/webhooks/998877/abcDEF"
            }"#,
        )
        .unwrap();
        assert_eq!(config.webhook_id(), Some(998877));
    }

    #[test]
    fn test_admin_lookup() {
        let config: Config = serde_json::from_str(
            r#"{
                "DISCORD_TOKEN": "t",
                "DISCORD_CHANNEL_ID": 1,
                "MINECRAFT_SERVER_RCON_IP": "127.0.0.1",
                "ADMINS": ["42", 43]
            }"#,
        )
        .unwrap();
        assert!(config.is_admin(42));
        assert!(config.is_admin(43));
        assert!(!config.is_admin(44));
        assert_eq!(config.prefix, "!");
        assert_eq!(config.rcon_port, 25575);
    }
}
