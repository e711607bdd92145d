//! Common types shared across the application.

pub mod error;
pub mod messages;

pub use messages::{
    Author, ChannelInfo, ChatEvent, ChatSource, RenderedMessage, RosterEntry, UserRoster,
    WebhookPayload,
};
