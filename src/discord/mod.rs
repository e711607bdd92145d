//! Discord bot integration.
//!
//! This module provides the gateway client, the outbound operations the relay
//! performs against Discord, and mention resolution.

pub mod client;
pub mod outlet;
pub mod resolver;

pub use client::DiscordBot;
