//! Gating of remote catalog candidates against current file values.

use crate::field_normalizer;
use crate::fields::TagField;
use crate::protocol::{FileRecordSnapshot, ScanRow, SearchCandidate};

/// Field updates one candidate yields for one file, after the update gate.
/// Album, year, and track are staged for any candidate; artist only when the
/// user explicitly chose this candidate from a list.
pub fn stage_candidate(
    candidate: &SearchCandidate,
    current: &FileRecordSnapshot,
    chosen: bool,
) -> Vec<(TagField, String)> {
    let mut updates = Vec::new();

    let mut gate = |field: TagField, proposed: Option<&str>, current_value: &str| {
        if let Some(proposed) = proposed {
            if let Some(value) = field_normalizer::update_if_different(field, proposed, current_value)
            {
                updates.push((field, value));
            }
        }
    };

    gate(TagField::Album, candidate.album.as_deref(), &current.album);
    gate(TagField::Date, candidate.year.as_deref(), &current.date);
    gate(TagField::Track, candidate.track.as_deref(), &current.track);
    if chosen {
        gate(
            TagField::Artist,
            candidate.artist.as_deref(),
            &current.artist,
        );
    }

    updates
}

/// True when the catalog candidate disagrees with the row's current values.
/// Fields the candidate does not carry are never counted as disagreement.
pub fn candidate_differs(row: &ScanRow, candidate: &SearchCandidate) -> bool {
    if let Some(album) = candidate.album.as_deref() {
        if album.trim() != row.album.trim() {
            return true;
        }
    }
    if let Some(year) = candidate.year.as_deref() {
        if year.trim() != row_year(&row.date) {
            return true;
        }
    }
    if let Some(track) = candidate.track.as_deref() {
        if normalized_track(track) != normalized_track(&row.track) {
            return true;
        }
    }
    false
}

fn row_year(date: &str) -> &str {
    let trimmed = date.trim();
    trimmed.get(..4).unwrap_or(trimmed)
}

fn normalized_track(raw: &str) -> String {
    field_normalizer::tag_form(raw).unwrap_or_else(|| raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> SearchCandidate {
        SearchCandidate {
            title: "Love wins all".to_string(),
            artist: Some("IU".to_string()),
            album: Some("The Winning".to_string()),
            year: Some("2024".to_string()),
            track: Some("2".to_string()),
        }
    }

    fn current() -> FileRecordSnapshot {
        FileRecordSnapshot {
            artist: "iu".to_string(),
            album: "Palette".to_string(),
            date: "2017".to_string(),
            track: "4".to_string(),
            ..FileRecordSnapshot::default()
        }
    }

    #[test]
    fn test_unchosen_candidate_stages_album_year_track_only() {
        let updates = stage_candidate(&candidate(), &current(), false);
        assert_eq!(
            updates,
            vec![
                (TagField::Album, "The Winning".to_string()),
                (TagField::Date, "2024".to_string()),
                (TagField::Track, "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_chosen_candidate_also_stages_artist() {
        let updates = stage_candidate(&candidate(), &current(), true);
        assert!(updates.contains(&(TagField::Artist, "IU".to_string())));
    }

    #[test]
    fn test_values_equal_to_current_are_not_staged() {
        let mut row = current();
        row.album = "The Winning".to_string();
        row.date = "2024".to_string();
        row.track = "2".to_string();
        assert!(stage_candidate(&candidate(), &row, false).is_empty());
    }

    #[test]
    fn test_padded_track_proposal_equal_after_normalization_is_not_staged() {
        let mut partial = candidate();
        partial.album = None;
        partial.year = None;
        partial.track = Some("04".to_string());
        let row = current();
        assert!(stage_candidate(&partial, &row, false).is_empty());
    }

    #[test]
    fn test_unknown_candidate_fields_stage_nothing() {
        let bare = SearchCandidate {
            title: "Demo take".to_string(),
            ..SearchCandidate::default()
        };
        assert!(stage_candidate(&bare, &current(), true).is_empty());
    }

    #[test]
    fn test_differs_ignores_formatting_noise() {
        let row = ScanRow {
            album: "The Winning".to_string(),
            date: "2024-01-24".to_string(),
            track: "02".to_string(),
            ..ScanRow::default()
        };
        assert!(!candidate_differs(&row, &candidate()));
    }

    #[test]
    fn test_differs_flags_album_change() {
        let row = ScanRow {
            album: "Palette".to_string(),
            date: "2024".to_string(),
            track: "2".to_string(),
            ..ScanRow::default()
        };
        assert!(candidate_differs(&row, &candidate()));
    }

    #[test]
    fn test_differs_treats_unknown_fields_as_agreement() {
        let row = ScanRow::default();
        let bare = SearchCandidate {
            title: "Demo take".to_string(),
            ..SearchCandidate::default()
        };
        assert!(!candidate_differs(&row, &bare));
    }
}
