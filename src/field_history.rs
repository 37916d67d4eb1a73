//! Recent-value history for tag fields.

use std::collections::HashMap;

use crate::fields::TagField;

/// Values kept per field before the oldest is dropped.
const HISTORY_CAPACITY: usize = 10;

/// Per-field recency list of values applied through the engine. The newest
/// value sits at the end; re-applying a known value moves it back there
/// instead of duplicating it.
#[derive(Debug, Default)]
pub struct FieldHistory {
    entries: HashMap<TagField, Vec<String>>,
}

impl FieldHistory {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Records an applied value. Empty values and the clear keyword carry no
    /// reuse value and are ignored.
    pub fn record(&mut self, field: TagField, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
            return;
        }
        let values = self.entries.entry(field).or_default();
        values.retain(|known| known != trimmed);
        values.push(trimmed.to_string());
        if values.len() > HISTORY_CAPACITY {
            values.remove(0);
        }
    }

    /// Values recorded for the field, oldest first.
    pub fn values(&self, field: TagField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reapplied_value_moves_to_the_end() {
        let mut history = FieldHistory::new();
        history.record(TagField::Genre, "Rock");
        history.record(TagField::Genre, "Pop");
        history.record(TagField::Genre, "Rock");
        assert_eq!(history.values(TagField::Genre), ["Pop", "Rock"]);
    }

    #[test]
    fn test_capacity_drops_the_oldest_value() {
        let mut history = FieldHistory::new();
        for index in 0..11 {
            history.record(TagField::Album, &format!("Album {index}"));
        }
        let values = history.values(TagField::Album);
        assert_eq!(values.len(), 10);
        assert_eq!(values.first().map(String::as_str), Some("Album 1"));
        assert_eq!(values.last().map(String::as_str), Some("Album 10"));
    }

    #[test]
    fn test_empty_and_clear_values_are_ignored() {
        let mut history = FieldHistory::new();
        history.record(TagField::Artist, "");
        history.record(TagField::Artist, "   ");
        history.record(TagField::Artist, "NULL");
        history.record(TagField::Artist, "null");
        assert!(history.values(TagField::Artist).is_empty());
    }

    #[test]
    fn test_fields_keep_separate_histories() {
        let mut history = FieldHistory::new();
        history.record(TagField::Artist, "IU");
        history.record(TagField::Genre, "K-Pop");
        assert_eq!(history.values(TagField::Artist), ["IU"]);
        assert_eq!(history.values(TagField::Genre), ["K-Pop"]);
    }
}
