//! Mention resolution for Minecraft -> Discord text.
//!
//! Rewrites `@name#discriminator` tokens into Discord mention syntax using a
//! snapshot of known users.

use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::{debug, warn};

use crate::common::{RosterEntry, UserRoster};

/// `@` followed by a whitespace-delimited run.
static MENTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\S+)").expect("mention pattern is valid"));

/// Mention resolver for outbound Discord messages.
#[derive(Debug, Clone, Copy)]
pub struct MentionResolver {
    enabled: bool,
}

impl MentionResolver {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Replace `@name#disc` tokens with `<@id>` for exact roster matches.
    ///
    /// Tokens without a discriminator or without a match stay literal. When
    /// disabled, the text is returned unchanged.
    pub fn resolve(&self, message: &str, roster: &UserRoster) -> String {
        if !self.enabled {
            return message.to_string();
        }

        let tokens: Vec<&str> = MENTION_TOKEN
            .find_iter(message)
            .filter_map(|found| match found {
                Ok(found) => Some(found.as_str()),
                Err(e) => {
                    warn!("Mention scan failed: {}", e);
                    None
                }
            })
            .collect();

        let mut result = message.to_string();
        for token in tokens {
            let name_part = token.strip_prefix('@').unwrap_or(token);
            let mut parts = name_part.split('#');
            let username = parts.next().unwrap_or_default();
            let Some(discriminator) = parts.next() else {
                continue;
            };

            if let Some(user) = find_user(roster, username, discriminator) {
                debug!("Resolved mention {} -> {}", token, user.id);
                result = result.replacen(token, &format!("<@{}>", user.id), 1);
            }
        }

        result
    }
}

/// First roster entry with exactly this username and discriminator.
fn find_user<'a>(
    roster: &'a UserRoster,
    username: &str,
    discriminator: &str,
) -> Option<&'a RosterEntry> {
    roster
        .iter()
        .find(|user| user.username == username && user.discriminator == discriminator)
}
