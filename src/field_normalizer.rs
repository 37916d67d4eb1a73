//! Canonical field-value shaping and the update-if-different gate.
//!
//! Track numbers carry two representations: a minimal-width integer string
//! stored in tags and a two-digit zero-padded string used in filenames.

use crate::fields::TagField;

/// Placeholder meaning "unknown"; displayed by shells, never written anywhere.
pub const UNKNOWN_PLACEHOLDER: &str = "-";

fn is_all_ascii_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// Minimal-width integer string for tag storage (`"07"` -> `"7"`), or `None`
/// when the value is not a plain digit string.
pub fn tag_form(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !is_all_ascii_digits(trimmed) {
        return None;
    }
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() {
        Some("0".to_string())
    } else {
        Some(stripped.to_string())
    }
}

/// Two-digit zero-padded form for filenames (`"7"` -> `"07"`). Values needing
/// three or more digits keep their natural width; non-digit values coerce to
/// `"00"`.
pub fn filename_form(raw: &str) -> String {
    match tag_form(raw) {
        Some(minimal) if minimal.len() >= 2 => minimal,
        Some(minimal) => format!("0{minimal}"),
        None => "00".to_string(),
    }
}

/// Update-if-different gate. Returns the value to stage, or `None` when the
/// proposal is empty, the unknown placeholder, or equal to the current value.
/// Track proposals are integer-normalized before the comparison.
pub fn update_if_different(field: TagField, proposed: &str, current: &str) -> Option<String> {
    let current = current.trim();
    let mut candidate = proposed.trim().to_string();
    if field == TagField::Track {
        if let Some(minimal) = tag_form(&candidate) {
            candidate = minimal;
        }
    }
    if candidate.is_empty() || candidate == UNKNOWN_PLACEHOLDER || candidate == current {
        return None;
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_form_strips_leading_zeros() {
        assert_eq!(tag_form("007"), Some("7".to_string()));
        assert_eq!(tag_form("3"), Some("3".to_string()));
        assert_eq!(tag_form("000"), Some("0".to_string()));
    }

    #[test]
    fn test_tag_form_rejects_non_digit_values() {
        assert_eq!(tag_form("3/12"), None);
        assert_eq!(tag_form("A1"), None);
        assert_eq!(tag_form(""), None);
        assert_eq!(tag_form("-"), None);
    }

    #[test]
    fn test_filename_form_pads_to_two_digits() {
        assert_eq!(filename_form("007"), "07");
        assert_eq!(filename_form("3"), "03");
        assert_eq!(filename_form("12"), "12");
    }

    #[test]
    fn test_filename_form_keeps_natural_width_past_two_digits() {
        assert_eq!(filename_form("1234"), "1234");
        assert_eq!(filename_form("0100"), "100");
    }

    #[test]
    fn test_filename_form_coerces_non_digits() {
        assert_eq!(filename_form("B1"), "00");
        assert_eq!(filename_form(""), "00");
    }

    #[test]
    fn test_forms_are_idempotent() {
        for input in ["007", "3", "1234", "000"] {
            let tagged = tag_form(input).unwrap();
            assert_eq!(tag_form(&tagged), Some(tagged.clone()));
            let named = filename_form(input);
            assert_eq!(filename_form(&named), named);
        }
    }

    #[test]
    fn test_gate_refuses_equal_values() {
        assert_eq!(update_if_different(TagField::Date, "2020", "2020"), None);
    }

    #[test]
    fn test_gate_stages_differing_values() {
        assert_eq!(
            update_if_different(TagField::Date, "2021", "2020"),
            Some("2021".to_string())
        );
    }

    #[test]
    fn test_gate_refuses_placeholder_and_empty() {
        assert_eq!(update_if_different(TagField::Album, "-", "Palette"), None);
        assert_eq!(update_if_different(TagField::Album, "  ", "Palette"), None);
    }

    #[test]
    fn test_gate_normalizes_track_proposals() {
        assert_eq!(
            update_if_different(TagField::Track, "08", "7"),
            Some("8".to_string())
        );
        assert_eq!(update_if_different(TagField::Track, "07", "7"), None);
    }
}
