//! Configuration file parsing (JSON format).

use std::fs;
use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    load_config_str(&content)
}

/// Load configuration from a JSON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_str(
            r#"{
                "DISCORD_TOKEN": "token",
                "DISCORD_CHANNEL_ID": "123",
                "MINECRAFT_SERVER_RCON_IP": "localhost"
            }"#,
        )
        .unwrap();

        assert_eq!(config.discord_channel_id.get(), 123);
        assert!(!config.is_local_file);
        assert_eq!(config.port, 8000);
        assert_eq!(config.webhook, "/minecraft/hook");
        assert!(config.discord_message_template.contains("%username%"));
    }

    #[test]
    fn test_missing_required_field() {
        let result = load_config_str(r#"{ "DISCORD_TOKEN": "token" }"#);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "DISCORD_TOKEN": "token",
                "DISCORD_CHANNEL_ID": 5,
                "MINECRAFT_SERVER_RCON_IP": "10.0.0.2",
                "MINECRAFT_SERVER_RCON_PORT": 25580,
                "USE_WEBHOOKS": true
            }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.rcon_host, "10.0.0.2");
        assert_eq!(config.rcon_port, 25580);
        assert!(config.use_webhooks);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.json");
        let example = load_config(path).unwrap();
        let minimal = load_config_str(
            r#"{
                "DISCORD_TOKEN": "t",
                "DISCORD_CHANNEL_ID": "1",
                "MINECRAFT_SERVER_RCON_IP": "127.0.0.1"
            }"#,
        )
        .unwrap();

        assert_eq!(example.regex_match_chat_mc, minimal.regex_match_chat_mc);
        assert_eq!(example.regex_ansi_code, minimal.regex_ansi_code);
        assert_eq!(example.minecraft_tellraw_template, minimal.minecraft_tellraw_template);
        assert_eq!(example.discord_message_template, minimal.discord_message_template);
        assert_eq!(example.webhook_avatar_url_template, minimal.webhook_avatar_url_template);
        assert_eq!(example.rcon_port, minimal.rcon_port);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/mcrelay.json");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
