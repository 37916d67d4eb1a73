//! Cleanup pass for title text pasted from filenames or the web.
//!
//! Strips the artist name and user-supplied keyword phrases, pulls a leading
//! track number out of the text, and drops symbols outside the writing
//! systems the engine recognizes.

use crate::field_normalizer::tag_form;
use crate::text_integrity::is_expected_script;

/// Outcome of a title cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    /// Cleaned title text, whitespace-collapsed.
    pub title: String,
    /// Track number found at the head of the text, in tag form.
    pub track: Option<String>,
}

/// Replaces every case-insensitive occurrence of `phrase` with a space.
fn remove_phrase_ignore_case(text: &str, phrase: &str) -> String {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let lowered: Vec<String> = chars
        .iter()
        .map(|ch| ch.to_lowercase().to_string())
        .collect();
    let needle: Vec<String> = phrase
        .chars()
        .map(|ch| ch.to_lowercase().to_string())
        .collect();

    let mut output = String::with_capacity(text.len());
    let mut index = 0;
    while index < chars.len() {
        if index + needle.len() <= chars.len() && lowered[index..index + needle.len()] == needle[..]
        {
            output.push(' ');
            index += needle.len();
        } else {
            output.push(chars[index]);
            index += 1;
        }
    }
    output
}

/// Splits a leading track number followed by `.`/`-`/`_`/whitespace
/// separators off the front of the text.
fn split_leading_track(text: &str) -> Option<(&str, &str)> {
    let digit_len = text
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(text.len());
    if digit_len == 0 || digit_len == text.len() {
        return None;
    }

    let (digits, rest) = text.split_at(digit_len);
    let separator_len = rest
        .find(|ch: char| !(matches!(ch, '.' | '-' | '_') || ch.is_whitespace()))
        .unwrap_or(rest.len());
    if separator_len == 0 {
        return None;
    }
    Some((digits, &rest[separator_len..]))
}

fn is_allowed_title_char(ch: char) -> bool {
    is_expected_script(ch)
        || ch.is_ascii_digit()
        || ch.is_whitespace()
        || matches!(ch, '(' | ')' | '[' | ']' | '.' | '&' | '\'')
}

/// Cleans a raw title: artist name and `;`-separated keyword phrases are
/// removed case-insensitively, a leading track number is extracted, and
/// disallowed symbols collapse into single spaces.
pub fn parse_title(raw: &str, artist: &str, keywords: &str) -> ParsedTitle {
    let mut clean = raw.trim().to_string();

    if !artist.trim().is_empty() {
        clean = remove_phrase_ignore_case(&clean, artist);
    }
    for keyword in keywords.split(';') {
        if !keyword.trim().is_empty() {
            clean = remove_phrase_ignore_case(&clean, keyword);
        }
    }

    let mut track = None;
    let trimmed = clean.trim().to_string();
    if let Some((digits, rest)) = split_leading_track(&trimmed) {
        track = tag_form(digits);
        clean = rest.to_string();
    } else {
        clean = trimmed;
    }

    let swept: String = clean
        .chars()
        .map(|ch| if is_allowed_title_char(ch) { ch } else { ' ' })
        .collect();
    let title = swept.split_whitespace().collect::<Vec<_>>().join(" ");

    ParsedTitle { title, track }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_extracts_leading_track() {
        let parsed = parse_title("IU 08 Love wins all", "IU", "");
        assert_eq!(parsed.track, Some("8".to_string()));
        assert_eq!(parsed.title, "Love wins all");
    }

    #[test]
    fn test_parse_title_removes_keyword_phrases() {
        let parsed = parse_title(
            "Love wins all (Official Music Video)",
            "",
            "(Official Music Video);MV",
        );
        assert_eq!(parsed.track, None);
        assert_eq!(parsed.title, "Love wins all");
    }

    #[test]
    fn test_parse_title_sweeps_disallowed_symbols() {
        let parsed = parse_title("Love ♥ wins ★", "", "");
        assert_eq!(parsed.title, "Love wins");
    }

    #[test]
    fn test_parse_title_keeps_all_digit_titles() {
        let parsed = parse_title("2002", "", "");
        assert_eq!(parsed.track, None);
        assert_eq!(parsed.title, "2002");
    }

    #[test]
    fn test_parse_title_handles_dot_separators() {
        let parsed = parse_title("03. 밤편지", "", "");
        assert_eq!(parsed.track, Some("3".to_string()));
        assert_eq!(parsed.title, "밤편지");
    }

    #[test]
    fn test_parse_title_artist_match_is_case_insensitive() {
        let parsed = parse_title("iu 01 Celebrity", "IU", "");
        assert_eq!(parsed.track, Some("1".to_string()));
        assert_eq!(parsed.title, "Celebrity");
    }
}
