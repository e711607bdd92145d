//! Relay core for Minecraft-Discord chat.
//!
//! ## Module Structure
//!
//! - `chat`: Console line parsing
//! - `dispatcher`: The bidirectional relay (`Relay` struct)
//! - `formatter`: Placeholder templates
//! - `sanitize`: Formatting code, emoji and escape sequence stripping

pub mod chat;
pub mod dispatcher;
pub mod formatter;
pub mod sanitize;

pub use dispatcher::Relay;
