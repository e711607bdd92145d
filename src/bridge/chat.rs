//! Chat-line parsing for Minecraft console output.
//!
//! Applies the configured patterns to a raw console line to extract the
//! speaker and the message text.

use fancy_regex::Regex;

use crate::bridge::sanitize::{strip_ansi_escape, strip_formatting_codes};
use crate::common::error::{ConfigError, ParseError};
use crate::config::Config;

/// A successfully parsed chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChat {
    pub username: String,
    pub message: String,
}

/// Outcome of parsing a line that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Chat(ParsedChat),
    /// Line matched the ignore pattern; nothing is relayed.
    Ignored,
}

/// Console line parser built from the configured patterns.
#[derive(Debug, Clone)]
pub struct ChatLineParser {
    ignore: Regex,
    matcher: Regex,
    escape: Regex,
}

impl ChatLineParser {
    /// Compile the three patterns.
    pub fn new(ignore: &str, matcher: &str, escape: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            ignore: compile("REGEX_IGNORED_CHAT", ignore)?,
            matcher: compile("REGEX_MATCH_CHAT_MC", matcher)?,
            escape: compile("REGEX_ASNI_CODE", escape)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            &config.regex_ignored_chat,
            &config.regex_match_chat_mc,
            &config.regex_ansi_code,
        )
    }

    /// Parse one console line.
    ///
    /// The match pattern must capture the username in group 1 and the message
    /// in group 2.
    pub fn parse(&self, line: &str) -> Result<ParseOutcome, ParseError> {
        if self.ignore.is_match(line)? {
            return Ok(ParseOutcome::Ignored);
        }

        let captures = self
            .matcher
            .captures(line)?
            .ok_or_else(|| ParseError::NoMatch {
                line: line.to_string(),
            })?;

        let username = captures
            .get(1)
            .ok_or(ParseError::MissingGroup { group: 1 })?
            .as_str();
        let message = captures
            .get(2)
            .ok_or(ParseError::MissingGroup { group: 2 })?
            .as_str();

        Ok(ParseOutcome::Chat(ParsedChat {
            username: strip_formatting_codes(username),
            message: strip_ansi_escape(message, &self.escape).into_owned(),
        }))
    }
}

fn compile(field: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        field: field.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{DEFAULT_ANSI_CODE, DEFAULT_IGNORED_CHAT, DEFAULT_MATCH_CHAT};

    fn default_parser() -> ChatLineParser {
        ChatLineParser::new(DEFAULT_IGNORED_CHAT, DEFAULT_MATCH_CHAT, DEFAULT_ANSI_CODE).unwrap()
    }

    fn chat(username: &str, message: &str) -> ParseOutcome {
        ParseOutcome::Chat(ParsedChat {
            username: username.to_string(),
            message: message.to_string(),
        })
    }

    #[test]
    fn test_parse_custom_pattern() {
        let parser = ChatLineParser::new("^$", r"<Server> (\w+): <(.*)>", DEFAULT_ANSI_CODE).unwrap();
        assert_eq!(
            parser.parse("<Server> Bob: <hi there>").unwrap(),
            chat("Bob", "hi there")
        );
    }

    #[test]
    fn test_parse_vanilla_log_line() {
        let parser = default_parser();
        let line = "[12:34:56] [Server thread/INFO]: <Steve> hello world";
        assert_eq!(parser.parse(line).unwrap(), chat("Steve", "hello world"));
    }

    #[test]
    fn test_ignored_line() {
        let parser = default_parser();
        let line = "[Server thread/INFO]: <Steve> was kicked for sending packets too frequently";
        assert_eq!(parser.parse(line).unwrap(), ParseOutcome::Ignored);
    }

    #[test]
    fn test_no_match_is_error() {
        let parser = default_parser();
        let result = parser.parse("[Server thread/INFO]: Steve joined the game");
        assert!(matches!(result, Err(ParseError::NoMatch { .. })));
    }

    #[test]
    fn test_single_group_pattern_is_error() {
        let parser = ChatLineParser::new("^$", r"<(\w+)> .*", DEFAULT_ANSI_CODE).unwrap();
        let result = parser.parse("<Steve> hello");
        assert!(matches!(result, Err(ParseError::MissingGroup { group: 2 })));
    }

    #[test]
    fn test_formatting_codes_stripped_from_username() {
        let parser = default_parser();
        let line = "[Server thread/INFO]: <§cAdmin§rSteve> hi";
        assert_eq!(parser.parse(line).unwrap(), chat("AdminSteve", "hi"));
    }

    #[test]
    fn test_first_escape_sequence_stripped_from_message() {
        let parser = default_parser();
        let line = "[Server thread/INFO]: <Steve> \u{1b}[0mhi\u{1b}[0m";
        assert_eq!(parser.parse(line).unwrap(), chat("Steve", "hi\u{1b}[0m"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = ChatLineParser::new("(", DEFAULT_MATCH_CHAT, DEFAULT_ANSI_CODE);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }
}
