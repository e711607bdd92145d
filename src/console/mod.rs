//! Minecraft console input sources.
//!
//! Two interchangeable push sources deliver raw console lines into the same
//! channel: a local log tail or an HTTP webhook receiver.

pub mod tail;
pub mod webhook;

use std::fmt;

use tokio::sync::mpsc;

use crate::common::error::{ConfigError, SourceError};
use crate::config::Config;

pub use tail::LogTail;
pub use webhook::WebhookReceiver;

/// The configured console line source.
#[derive(Debug, Clone)]
pub enum InputSource {
    LocalFile(LogTail),
    Webhook(WebhookReceiver),
}

impl InputSource {
    /// Pick the source from `IS_LOCAL_FILE`. A missing log file is fatal.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.is_local_file {
            Ok(Self::LocalFile(LogTail::open(&config.local_file_path)?))
        } else {
            Ok(Self::Webhook(WebhookReceiver::new(
                config.port,
                config.webhook.clone(),
            )))
        }
    }

    /// Push raw lines into `tx` until the source stops.
    pub async fn run(self, tx: mpsc::UnboundedSender<String>) -> Result<(), SourceError> {
        match self {
            Self::LocalFile(tail) => tail.run(tx).await,
            Self::Webhook(receiver) => receiver.run(tx).await,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalFile(tail) => write!(f, "local file {}", tail.path().display()),
            Self::Webhook(receiver) => {
                write!(f, "webhook on *:{}{}", receiver.port(), receiver.path())
            }
        }
    }
}
