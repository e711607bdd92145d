//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
///
/// Fatal at startup. Also raised at relay time when the configured Discord
/// channel cannot be resolved to a text channel.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid regex for '{field}': {message}")]
    InvalidPattern { field: String, message: String },

    #[error("Local file not found at '{path}'")]
    LocalFileMissing { path: String },

    #[error("Discord channel {channel_id} not found")]
    ChannelNotFound { channel_id: u64 },

    #[error("Discord channel {channel_id} is not a text channel")]
    NotTextChannel { channel_id: u64 },
}

/// A console line that does not have the shape of a chat message.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Line does not match the chat pattern: {line}")]
    NoMatch { line: String },

    #[error("Chat pattern is missing capture group {group} (needs username and message)")]
    MissingGroup { group: usize },

    #[error("Regex engine error: {message}")]
    Regex { message: String },
}

impl From<fancy_regex::Error> for ParseError {
    fn from(e: fancy_regex::Error) -> Self {
        Self::Regex {
            message: e.to_string(),
        }
    }
}

/// Remote console errors.
#[derive(Debug, Error)]
pub enum RconError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Authentication rejected by server")]
    AuthFailed,

    #[error("Command is {len} bytes, limit is {max}")]
    CommandTooLong { len: usize, max: usize },

    #[error("Invalid packet: {message}")]
    InvalidPacket { message: String },

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Session timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Console input source failures (log tail or webhook receiver).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to watch '{path}': {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },

    #[error("Failed to bind webhook receiver on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discord-related errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Webhook POST failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Failure of a single relay attempt. Logged and dropped, never retried.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("RCON error: {0}")]
    Rcon(#[from] RconError),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),
}

/// Result type alias for RCON operations.
pub type RconResult<T> = std::result::Result<T, RconError>;

/// Result type alias for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;
