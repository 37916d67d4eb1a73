//! Field identities and staged edit values shared across the engine.

use std::fmt;

/// Recognized tag fields, in canonical apply/display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagField {
    Title,
    Artist,
    AlbumArtist,
    Track,
    Album,
    Genre,
    Date,
}

impl TagField {
    /// Canonical order used by every per-field loop.
    pub const ALL: [TagField; 7] = [
        TagField::Title,
        TagField::Artist,
        TagField::AlbumArtist,
        TagField::Track,
        TagField::Album,
        TagField::Genre,
        TagField::Date,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TagField::Title => "title",
            TagField::Artist => "artist",
            TagField::AlbumArtist => "album_artist",
            TagField::Track => "track",
            TagField::Album => "album",
            TagField::Genre => "genre",
            TagField::Date => "date",
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// One staged edit slot: leave the tag unchanged, clear it, or set new text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    /// No instruction for this field.
    #[default]
    Unset,
    /// Explicit request to remove the field from the file.
    Clear,
    /// Set the field to this non-empty text.
    Value(String),
}

impl FieldValue {
    /// Parses raw shell input. Empty input means "leave unchanged", the
    /// reserved word `NULL` (any casing) means "clear", anything else is
    /// literal text, trimmed.
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            FieldValue::Unset
        } else if trimmed.eq_ignore_ascii_case("null") {
            FieldValue::Clear
        } else {
            FieldValue::Value(trimmed.to_string())
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, FieldValue::Clear)
    }

    /// The staged text, when this slot carries one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Value(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// The full set of staged edits, one slot per recognized field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditFieldSet {
    pub title: FieldValue,
    pub artist: FieldValue,
    pub album_artist: FieldValue,
    pub track: FieldValue,
    pub album: FieldValue,
    pub genre: FieldValue,
    pub date: FieldValue,
}

impl EditFieldSet {
    pub fn get(&self, field: TagField) -> &FieldValue {
        match field {
            TagField::Title => &self.title,
            TagField::Artist => &self.artist,
            TagField::AlbumArtist => &self.album_artist,
            TagField::Track => &self.track,
            TagField::Album => &self.album,
            TagField::Genre => &self.genre,
            TagField::Date => &self.date,
        }
    }

    pub fn set(&mut self, field: TagField, value: FieldValue) {
        match field {
            TagField::Title => self.title = value,
            TagField::Artist => self.artist = value,
            TagField::AlbumArtist => self.album_artist = value,
            TagField::Track => self.track = value,
            TagField::Album => self.album = value,
            TagField::Genre => self.genre = value,
            TagField::Date => self.date = value,
        }
    }

    /// Builds a set from raw per-field shell input, in `TagField::ALL` order.
    pub fn from_inputs(inputs: &[(TagField, &str)]) -> Self {
        let mut edits = EditFieldSet::default();
        for (field, raw) in inputs {
            edits.set(*field, FieldValue::from_input(raw));
        }
        edits
    }

    /// True when no field carries an instruction.
    pub fn is_empty(&self) -> bool {
        TagField::ALL.iter().all(|field| self.get(*field).is_unset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_empty_is_unset() {
        assert_eq!(FieldValue::from_input("   "), FieldValue::Unset);
    }

    #[test]
    fn test_from_input_null_any_casing_is_clear() {
        assert_eq!(FieldValue::from_input("NULL"), FieldValue::Clear);
        assert_eq!(FieldValue::from_input("Null"), FieldValue::Clear);
        assert_eq!(FieldValue::from_input(" null "), FieldValue::Clear);
    }

    #[test]
    fn test_from_input_trims_ordinary_text() {
        assert_eq!(
            FieldValue::from_input("  IU  "),
            FieldValue::Value("IU".to_string())
        );
    }

    #[test]
    fn test_edit_set_round_trips_every_field() {
        let mut edits = EditFieldSet::default();
        assert!(edits.is_empty());
        for field in TagField::ALL {
            edits.set(field, FieldValue::Value(field.name().to_string()));
        }
        for field in TagField::ALL {
            assert_eq!(edits.get(field).as_text(), Some(field.name()));
        }
        assert!(!edits.is_empty());
    }
}
