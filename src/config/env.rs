//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `MCRELAY_CONFIG` - Config file path (when no CLI argument is given)
//! - `MCRELAY_DISCORD_TOKEN` - Discord bot token
//! - `MCRELAY_RCON_PASSWORD` - RCON password
//! - `MCRELAY_WEBHOOK_URL` - Discord webhook URL
//! - `PORT` - Webhook receiver port

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "MCRELAY";

/// Default config file name.
const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Apply environment variable overrides to a config.
///
/// This allows secrets to be provided via environment variables instead of
/// the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord_token = token;
    }
    if let Ok(password) = env::var(format!("{}_RCON_PASSWORD", ENV_PREFIX)) {
        config.rcon_password = password;
    }
    if let Ok(url) = env::var(format!("{}_WEBHOOK_URL", ENV_PREFIX)) {
        config.webhook_url = url;
    }

    // Hosting platforms hand out the listen port this way
    if let Ok(port) = env::var("PORT") {
        if let Ok(port) = port.parse() {
            config.port = port;
        }
    }

    config
}

/// Check if any secret environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_DISCORD_TOKEN", ENV_PREFIX),
        format!("{}_RCON_PASSWORD", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path.
///
/// Uses the first CLI argument, then `MCRELAY_CONFIG`, otherwise "config.json".
pub fn get_config_path() -> String {
    config_path_from(env::args().nth(1))
}

fn config_path_from(arg: Option<String>) -> String {
    arg.or_else(|| env::var(format!("{}_CONFIG", ENV_PREFIX)).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}
