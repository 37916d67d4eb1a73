//! Garbled-text detection for tag values that went through a wrong decode.
//!
//! Titles mis-decoded between legacy encodings end up dominated by Latin-1
//! supplement symbols or the replacement character. The classifier checks the
//! value against the writing systems this tool actually encounters (Latin,
//! Hangul, Han, Hiragana, Katakana) and flags everything else.

use std::path::Path;

use log::info;

use crate::field_normalizer::UNKNOWN_PLACEHOLDER;

const MIN_VALID_RATIO: f32 = 0.5;
const MAX_ANOMALY_RATIO: f32 = 0.3;
const MAX_SYMBOL_RESIDUE_RATIO: f32 = 0.2;
const LOG_PREVIEW_CHARS: usize = 24;

fn is_hangul(ch: char) -> bool {
    matches!(
        ch,
        '\u{AC00}'..='\u{D7A3}'
            | '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{D7B0}'..='\u{D7FF}'
    )
}

fn is_latin(ch: char) -> bool {
    if ch.is_ascii_alphabetic() {
        return true;
    }
    // The Latin-1 multiplication/division signs sit inside the letter block.
    if ch == '\u{00D7}' || ch == '\u{00F7}' {
        return false;
    }
    matches!(
        ch,
        '\u{00C0}'..='\u{00FF}' | '\u{0100}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}'
    )
}

fn is_han(ch: char) -> bool {
    matches!(
        ch,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}'
    )
}

fn is_hiragana(ch: char) -> bool {
    matches!(ch, '\u{3041}'..='\u{309F}')
}

fn is_katakana(ch: char) -> bool {
    matches!(
        ch,
        '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9D}'
    )
}

pub(crate) fn is_expected_script(ch: char) -> bool {
    is_hangul(ch) || is_latin(ch) || is_han(ch) || is_hiragana(ch) || is_katakana(ch)
}

fn is_common_punct(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')' | '[' | ']' | '.' | '&' | '!' | '?' | '-' | '_' | ',' | '\'' | '"'
    )
}

fn counts_as_valid(ch: char) -> bool {
    is_expected_script(ch) || ch.is_ascii_digit() || ch.is_whitespace() || is_common_punct(ch)
}

/// Anomalies are everything outside the CJK/Hangul scripts and 7-bit ASCII.
/// Latin letters beyond ASCII count: mojibake lands overwhelmingly in the
/// Latin-1 supplement.
fn counts_as_anomaly(ch: char) -> bool {
    !(ch.is_ascii() || is_hangul(ch) || is_han(ch) || is_hiragana(ch) || is_katakana(ch))
}

fn has_consecutive_non_ascii(text: &str, run_length: usize) -> bool {
    let mut run = 0usize;
    for ch in text.chars() {
        if ch.is_ascii() {
            run = 0;
        } else {
            run += 1;
            if run >= run_length {
                return true;
            }
        }
    }
    false
}

/// Returns true when `text` looks like the product of a wrong decode rather
/// than a real title. Empty and placeholder values count as corrupted so
/// callers fall through to their filename-based fallback.
pub fn is_corrupted(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_PLACEHOLDER {
        return true;
    }
    if trimmed.contains('\u{FFFD}') {
        return true;
    }

    let total = trimmed.chars().count() as f32;

    let valid = trimmed.chars().filter(|ch| counts_as_valid(*ch)).count() as f32;
    if valid / total < MIN_VALID_RATIO {
        return true;
    }

    let anomalies = trimmed.chars().filter(|ch| counts_as_anomaly(*ch)).count() as f32;
    if anomalies / total > MAX_ANOMALY_RATIO {
        return true;
    }

    let residue: String = trimmed
        .chars()
        .filter(|ch| !(is_expected_script(*ch) || ch.is_whitespace() || ch.is_ascii_digit()))
        .collect();
    let residue_len = residue.chars().count() as f32;
    if residue_len > total * MAX_SYMBOL_RESIDUE_RATIO && has_consecutive_non_ascii(&residue, 2) {
        return true;
    }

    false
}

/// Title to present for a record: the tag title when it is intact, otherwise
/// the file's stem. The substitution is logged so the loss stays observable.
pub fn display_title(tag_title: &str, path: &Path) -> String {
    if !is_corrupted(tag_title) {
        return tag_title.trim().to_string();
    }

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("")
        .to_string();
    let preview: String = tag_title.chars().take(LOG_PREVIEW_CHARS).collect();
    info!(
        "TextIntegrity: garbled title {:?} replaced with file stem {:?}",
        preview, stem
    );
    stem
}
