//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Discord
    if config.discord_token.is_empty() {
        errors.push("DISCORD_TOKEN is required".to_string());
    }
    if config.discord_token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("DISCORD_TOKEN has not been configured (still using placeholder)".to_string());
    }
    if config.discord_channel_id.get() == 0 {
        errors.push("DISCORD_CHANNEL_ID must be non-zero".to_string());
    }
    if config.use_webhooks && config.webhook_url.is_empty() {
        errors.push("WEBHOOK_URL is required when USE_WEBHOOKS is enabled".to_string());
    }

    // Input source
    if config.is_local_file {
        if config.local_file_path.is_empty() {
            errors.push("LOCAL_FILE_PATH is required when IS_LOCAL_FILE is enabled".to_string());
        }
    } else {
        if !config.webhook.starts_with('/') {
            errors.push(format!("WEBHOOK path '{}' must start with '/'", config.webhook));
        }
        if let Some(segment) = capture_segment(&config.webhook) {
            errors.push(format!(
                "WEBHOOK path '{}' must be literal, found route pattern '{}'",
                config.webhook, segment
            ));
        }
        if config.port == 0 {
            errors.push("PORT must be non-zero".to_string());
        }
    }

    // RCON
    if config.rcon_host.is_empty() {
        errors.push("MINECRAFT_SERVER_RCON_IP is required".to_string());
    }
    if config.rcon_port == 0 {
        errors.push("MINECRAFT_SERVER_RCON_PORT must be non-zero".to_string());
    }
    if config.rcon_timeout_secs == 0 {
        errors.push("RCON_TIMEOUT_SECS must be non-zero".to_string());
    }

    if !config.admins.is_empty() && config.prefix.is_empty() {
        errors.push("PREFIX must not be empty when ADMINS are configured".to_string());
    }

    // Patterns (try to compile them)
    let patterns = [
        ("REGEX_MATCH_CHAT_MC", &config.regex_match_chat_mc),
        ("REGEX_IGNORED_CHAT", &config.regex_ignored_chat),
        ("REGEX_ASNI_CODE", &config.regex_ansi_code),
    ];
    for (field, pattern) in patterns {
        if let Err(e) = Regex::new(pattern) {
            errors.push(format!("{} is not a valid regex '{}': {}", field, pattern, e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

/// First segment the HTTP router would read as a capture or wildcard.
fn capture_segment(path: &str) -> Option<&str> {
    path.split('/').find(|segment| {
        segment.starts_with(':')
            || segment.starts_with('*')
            || segment.contains(['{', '}'])
    })
}
