//! Target filename assembly and collision handling.

use std::path::Path;

use crate::config::RenamePolicy;
use crate::field_normalizer::UNKNOWN_PLACEHOLDER;

/// Characters that cannot appear in a filename on the supported platforms.
const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const FALLBACK_ARTIST: &str = "Unknown";
const FALLBACK_TITLE: &str = "Untitled";

/// True when the value can serve as a filename part: non-empty, not the
/// unknown placeholder, not the clear keyword in any casing.
pub fn is_usable_name_part(value: &str) -> bool {
    let trimmed = value.trim();
    !(trimmed.is_empty()
        || trimmed == UNKNOWN_PLACEHOLDER
        || trimmed.eq_ignore_ascii_case("null"))
}

/// Resolves the artist/title parts for a record under the given policy.
/// Returns `None` when the record must be skipped.
pub fn name_parts_for(
    policy: RenamePolicy,
    artist: &str,
    title: &str,
) -> Option<(String, String)> {
    let artist_usable = is_usable_name_part(artist);
    let title_usable = is_usable_name_part(title);
    match policy {
        RenamePolicy::Strict => {
            if artist_usable && title_usable {
                Some((artist.trim().to_string(), title.trim().to_string()))
            } else {
                None
            }
        }
        RenamePolicy::Lenient => {
            let artist_part = if artist_usable {
                artist.trim().to_string()
            } else {
                FALLBACK_ARTIST.to_string()
            };
            let title_part = if title_usable {
                title.trim().to_string()
            } else {
                FALLBACK_TITLE.to_string()
            };
            Some((artist_part, title_part))
        }
    }
}

/// Builds `{artist} - {track} - {title}{extension}` and strips the reserved
/// characters afterwards, so a separator inside a field value never survives
/// into the name.
pub fn compose(artist: &str, track_filename_form: &str, title: &str, extension: &str) -> String {
    let assembled = format!("{artist} - {track_filename_form} - {title}{extension}");
    assembled
        .chars()
        .filter(|ch| !RESERVED_CHARS.contains(ch))
        .collect()
}

/// Appends `" (N)"` before the extension until the name is free in `folder`.
/// The check runs against the live directory rather than a snapshot, so names
/// produced earlier in the same batch are accounted for.
pub fn resolve_collision(folder: &Path, candidate_name: &str) -> String {
    if !folder.join(candidate_name).exists() {
        return candidate_name.to_string();
    }
    let (base, extension) = split_name_extension(candidate_name);
    let mut counter = 1u32;
    loop {
        let numbered = format!("{base} ({counter}){extension}");
        if !folder.join(&numbered).exists() {
            return numbered;
        }
        counter += 1;
    }
}

fn split_name_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}
