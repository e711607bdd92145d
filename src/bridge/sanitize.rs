//! Text sanitizing for relayed chat.
//!
//! Pure functions that strip Minecraft formatting codes, emoji and terminal
//! escape sequences without touching the surrounding text.

use std::borrow::Cow;
use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Section sign followed by one color/style code character.
static FORMATTING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"§[A-Za-z0-9]").expect("formatting code pattern is valid"));

/// Remove every `§` + code pair. Whitespace is left alone.
pub fn strip_formatting_codes(text: &str) -> String {
    FORMATTING_CODE.replace_all(text, "").into_owned()
}

/// Remove emoji glyphs, keeping letters, digits and punctuation.
///
/// Works per grapheme cluster so skin tones and ZWJ sequences go as a unit.
pub fn strip_emoji(text: &str) -> String {
    text.graphemes(true)
        .filter(|grapheme| !is_emoji(grapheme))
        .collect()
}

fn is_emoji(grapheme: &str) -> bool {
    if emojis::get(grapheme).is_some() {
        return true;
    }
    // Clusters the table does not list verbatim (e.g. stray variation selectors)
    let mut chars = grapheme.chars();
    match chars.next() {
        Some(first) if !first.is_ascii() => {
            let mut buf = [0u8; 4];
            emojis::get(first.encode_utf8(&mut buf)).is_some()
        }
        _ => false,
    }
}

/// Remove the first match of `pattern` from `text`.
///
/// Only the first occurrence is stripped. No match, or a regex engine error,
/// leaves the text unchanged.
pub fn strip_ansi_escape<'a>(text: &'a str, pattern: &Regex) -> Cow<'a, str> {
    match pattern.find(text) {
        Ok(Some(found)) if !found.as_str().is_empty() => {
            let mut stripped = String::with_capacity(text.len() - found.as_str().len());
            stripped.push_str(&text[..found.start()]);
            stripped.push_str(&text[found.end()..]);
            Cow::Owned(stripped)
        }
        Ok(_) => Cow::Borrowed(text),
        Err(e) => {
            warn!("Escape pattern failed on '{}': {}", text, e);
            Cow::Borrowed(text)
        }
    }
}

/// Escape text for embedding inside a JSON string literal.
pub fn escape_json_string(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_formatting_codes() {
        assert_eq!(strip_formatting_codes("§1Hello §2World"), "Hello World");
        assert_eq!(strip_formatting_codes("§lBold§r  spaced"), "Bold  spaced");
    }

    #[test]
    fn test_strip_formatting_keeps_plain_text() {
        assert_eq!(strip_formatting_codes("Steve_99"), "Steve_99");
        // A lone section sign is not a code pair
        assert_eq!(strip_formatting_codes("cost § !"), "cost § !");
    }

    #[test]
    fn test_strip_emoji() {
        assert_eq!(strip_emoji("Hello 😀 world"), "Hello  world");
        assert_eq!(strip_emoji("gg 👍🏽!"), "gg !");
        assert_eq!(strip_emoji("😀😂🎉"), "");
    }

    #[test]
    fn test_strip_emoji_preserves_text() {
        let text = "Grüße, 世界! 123 - ok?";
        assert_eq!(strip_emoji(text), text);
    }

    #[test]
    fn test_strip_ansi_first_match_only() {
        let pattern = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
        let text = "\u{1b}[0mhello\u{1b}[0m";
        assert_eq!(strip_ansi_escape(text, &pattern), "hello\u{1b}[0m");
    }

    #[test]
    fn test_strip_ansi_no_match_is_noop() {
        let pattern = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
        let stripped = strip_ansi_escape("plain text", &pattern);
        assert!(matches!(stripped, Cow::Borrowed("plain text")));
    }

    #[test]
    fn test_escape_json_string() {
        assert_eq!(escape_json_string(r#"say "hi" \o/"#), r#"say \"hi\" \\o/"#);
        assert_eq!(escape_json_string("line\nbreak"), r"line\nbreak");
        assert_eq!(escape_json_string("plain"), "plain");
    }
}
