//! Tag persistence backed by `lofty`, with a `symphonia` recovery path for
//! files lofty cannot parse.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lofty::config::{ParseOptions, ParsingMode, WriteOptions};
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::probe::Probe;
use lofty::read_from_path;
use lofty::tag::{ItemKey, Tag};
use log::debug;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{
    MetadataOptions, MetadataRevision, StandardTagKey, Value as SymphoniaValue,
};
use symphonia::core::probe::Hint;

use crate::fields::TagField;

/// Tag values read from one audio file. An empty string means the field is
/// absent in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSnapshot {
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub track: String,
    pub album: String,
    pub genre: String,
    pub date: String,
    pub bitrate_kbps: Option<u32>,
}

impl TagSnapshot {
    /// The stored value for a field.
    pub fn value(&self, field: TagField) -> &str {
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

    fn set_value(&mut self, field: TagField, value: String) {
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

    fn has_any_value(&self) -> bool {
        TagField::ALL.iter().any(|field| !self.value(*field).is_empty())
    }
}

/// Read/write access to the tag block of audio files. `write` takes field
/// deltas: `Some(value)` replaces the field, `None` removes it.
pub trait TagStore: Send {
    fn read(&self, path: &Path) -> Result<TagSnapshot, String>;
    fn write(&self, path: &Path, deltas: &[(TagField, Option<String>)]) -> Result<(), String>;
}

/// The production store.
#[derive(Debug, Default)]
pub struct LoftyTagStore;

impl LoftyTagStore {
    pub fn new() -> Self {
        Self
    }

    fn item_key(field: TagField) -> ItemKey {
        match field {
            TagField::Title => ItemKey::TrackTitle,
            TagField::Artist => ItemKey::TrackArtist,
            TagField::AlbumArtist => ItemKey::AlbumArtist,
            TagField::Track => ItemKey::TrackNumber,
            TagField::Album => ItemKey::AlbumTitle,
            TagField::Genre => ItemKey::Genre,
            TagField::Date => ItemKey::RecordingDate,
        }
    }

    fn apply_field_delta(tag: &mut Tag, field: TagField, value: Option<&str>) {
        let trimmed = value.map(str::trim).filter(|candidate| !candidate.is_empty());

        match field {
            TagField::Title => match trimmed {
                Some(value) => tag.set_title(value.to_string()),
                None => tag.remove_title(),
            },
            TagField::Artist => match trimmed {
                Some(value) => tag.set_artist(value.to_string()),
                None => tag.remove_artist(),
            },
            TagField::Album => match trimmed {
                Some(value) => tag.set_album(value.to_string()),
                None => tag.remove_album(),
            },
            _ => {
                let key = Self::item_key(field);
                tag.remove_key(key);
                if let Some(value) = trimmed {
                    tag.insert_text(key, value.to_string());
                }
            }
        }
    }
}

impl TagStore for LoftyTagStore {
    fn read(&self, path: &Path) -> Result<TagSnapshot, String> {
        if let Some(mut snapshot) = read_snapshot_with_lofty(path) {
            snapshot.bitrate_kbps = probe_audio_bitrate(path);
            return Ok(snapshot);
        }

        if let Some(snapshot) = read_snapshot_with_symphonia(path) {
            debug!(
                "Tag read recovered via symphonia fallback for {}",
                path.display()
            );
            return Ok(snapshot);
        }

        Err(format!(
            "Failed to read tags from {} in both lofty and symphonia paths",
            path.display()
        ))
    }

    fn write(&self, path: &Path, deltas: &[(TagField, Option<String>)]) -> Result<(), String> {
        if deltas.is_empty() {
            return Ok(());
        }

        let mut tagged_file =
            read_from_path(path).map_err(|error| format!("Failed to read tags: {error}"))?;
        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let tag = tagged_file
            .tag_mut(tag_type)
            .ok_or_else(|| format!("No writable tag available for {tag_type:?}"))?;

        for (field, value) in deltas {
            Self::apply_field_delta(tag, *field, value.as_deref());
        }

        tag.remove_empty();
        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|error| format!("Failed to write tags: {error}"))
    }
}

fn first_non_empty_value<F>(primary_tag: Option<&Tag>, tags: &[Tag], mut extractor: F) -> String
where
    F: FnMut(&Tag) -> Option<String>,
{
    if let Some(tag) = primary_tag {
        if let Some(value) = extractor(tag) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    for tag in tags {
        if let Some(value) = extractor(tag) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    String::new()
}

/// Keeps only the position part of vorbis-style `"3/12"` track values.
fn truncate_track_at_total(raw: &str) -> String {
    match raw.find('/') {
        Some(index) => raw[..index].trim().to_string(),
        None => raw.to_string(),
    }
}

fn tag_parse_options(parsing_mode: ParsingMode, max_junk_bytes: usize) -> ParseOptions {
    ParseOptions::new()
        .read_properties(false)
        .read_cover_art(false)
        .parsing_mode(parsing_mode)
        .max_junk_bytes(max_junk_bytes)
}

fn read_tagged_file(path: &Path) -> Option<TaggedFile> {
    let primary_options = tag_parse_options(ParsingMode::BestAttempt, 1024);
    let relaxed_options = tag_parse_options(ParsingMode::Relaxed, 64 * 1024);

    match Probe::open(path) {
        Ok(probe) => match probe.options(primary_options).read() {
            Ok(tagged_file) => return Some(tagged_file),
            Err(primary_error) => {
                debug!(
                    "Tag read primary parse failed for {}: {}",
                    path.display(),
                    primary_error
                );
            }
        },
        Err(open_error) => {
            debug!(
                "Tag read could not open {} with extension-based probe: {}",
                path.display(),
                open_error
            );
        }
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            debug!(
                "Tag read failed for {} while preparing relaxed/content-based fallback: {}",
                path.display(),
                error
            );
            return None;
        }
    };

    let guessed_probe = match Probe::new(BufReader::new(file))
        .options(relaxed_options)
        .guess_file_type()
    {
        Ok(probe) => probe,
        Err(error) => {
            debug!(
                "Tag read failed for {} while guessing file type from content: {}",
                path.display(),
                error
            );
            return None;
        }
    };

    match guessed_probe.read() {
        Ok(tagged_file) => {
            debug!(
                "Tag read recovered via relaxed/content-based parsing for {}",
                path.display()
            );
            Some(tagged_file)
        }
        Err(error) => {
            debug!(
                "Tag read failed for {} after relaxed/content-based fallback: {}",
                path.display(),
                error
            );
            None
        }
    }
}

fn read_snapshot_with_lofty(path: &Path) -> Option<TagSnapshot> {
    let tagged_file = read_tagged_file(path)?;
    let primary_tag = tagged_file.primary_tag();
    let tags = tagged_file.tags();

    let title = first_non_empty_value(primary_tag, tags, |tag| {
        tag.title().map(|value| value.into_owned())
    });
    let artist = first_non_empty_value(primary_tag, tags, |tag| {
        tag.artist().map(|value| value.into_owned())
    });
    let album_artist = first_non_empty_value(primary_tag, tags, |tag| {
        tag.get_string(ItemKey::AlbumArtist).map(str::to_string)
    });
    let track = first_non_empty_value(primary_tag, tags, |tag| {
        tag.get_string(ItemKey::TrackNumber)
            .map(str::to_string)
            .or_else(|| tag.track().map(|value| value.to_string()))
    });
    let album = first_non_empty_value(primary_tag, tags, |tag| {
        tag.album().map(|value| value.into_owned())
    });
    let genre = first_non_empty_value(primary_tag, tags, |tag| {
        tag.genre().map(|value| value.into_owned())
    });
    let date = first_non_empty_value(primary_tag, tags, |tag| {
        tag.get_string(ItemKey::RecordingDate)
            .or_else(|| tag.get_string(ItemKey::ReleaseDate))
            .or_else(|| tag.get_string(ItemKey::OriginalReleaseDate))
            .or_else(|| tag.get_string(ItemKey::Year))
            .map(str::to_string)
    });

    Some(TagSnapshot {
        title,
        artist,
        album_artist,
        track: truncate_track_at_total(&track),
        album,
        genre,
        date,
        bitrate_kbps: None,
    })
}

fn probe_audio_bitrate(path: &Path) -> Option<u32> {
    match read_from_path(path) {
        Ok(tagged_file) => tagged_file.properties().audio_bitrate(),
        Err(error) => {
            debug!("Bitrate probe failed for {}: {}", path.display(), error);
            None
        }
    }
}

fn open_symphonia_probe(path: &Path) -> Option<symphonia::core::probe::ProbeResult> {
    let file = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()
}

fn set_if_empty(target: &mut TagSnapshot, field: TagField, value: &str) -> bool {
    let trimmed = value.trim();
    if target.value(field).is_empty() && !trimmed.is_empty() {
        let stored = if field == TagField::Track {
            truncate_track_at_total(trimmed)
        } else {
            trimmed.to_string()
        };
        target.set_value(field, stored);
        true
    } else {
        false
    }
}

fn symphonia_value_to_string(value: &SymphoniaValue) -> String {
    value.to_string().trim().to_string()
}

fn apply_symphonia_tag(snapshot: &mut TagSnapshot, tag: &symphonia::core::meta::Tag) -> bool {
    let value = symphonia_value_to_string(&tag.value);
    if value.is_empty() {
        return false;
    }

    let mut updated = false;
    match tag.std_key {
        Some(StandardTagKey::TrackTitle) => {
            updated |= set_if_empty(snapshot, TagField::Title, &value)
        }
        Some(StandardTagKey::Artist) => updated |= set_if_empty(snapshot, TagField::Artist, &value),
        Some(StandardTagKey::AlbumArtist) => {
            updated |= set_if_empty(snapshot, TagField::AlbumArtist, &value)
        }
        Some(StandardTagKey::TrackNumber) => {
            updated |= set_if_empty(snapshot, TagField::Track, &value)
        }
        Some(StandardTagKey::Album) => updated |= set_if_empty(snapshot, TagField::Album, &value),
        Some(StandardTagKey::Genre) => updated |= set_if_empty(snapshot, TagField::Genre, &value),
        Some(StandardTagKey::Date)
        | Some(StandardTagKey::ReleaseDate)
        | Some(StandardTagKey::OriginalDate)
        | Some(StandardTagKey::TaggingDate) => {
            updated |= set_if_empty(snapshot, TagField::Date, &value)
        }
        _ => {}
    }

    if updated {
        return true;
    }

    match tag.key.trim().to_ascii_uppercase().as_str() {
        "TIT2" | "TITLE" => set_if_empty(snapshot, TagField::Title, &value),
        "TPE1" | "ARTIST" => set_if_empty(snapshot, TagField::Artist, &value),
        "TPE2" | "ALBUMARTIST" | "ALBUM_ARTIST" | "ALBUM ARTIST" => {
            set_if_empty(snapshot, TagField::AlbumArtist, &value)
        }
        "TRCK" | "TRACK" | "TRACKNUMBER" => set_if_empty(snapshot, TagField::Track, &value),
        "TALB" | "ALBUM" => set_if_empty(snapshot, TagField::Album, &value),
        "TCON" | "GENRE" => set_if_empty(snapshot, TagField::Genre, &value),
        "TDRC" | "TDRL" | "TDOR" | "TYER" | "DATE" | "YEAR" | "RELEASEDATE" | "ORIGINALDATE" => {
            set_if_empty(snapshot, TagField::Date, &value)
        }
        _ => false,
    }
}

fn apply_symphonia_revision(snapshot: &mut TagSnapshot, revision: &MetadataRevision) -> bool {
    let mut updated = false;
    for tag in revision.tags() {
        updated |= apply_symphonia_tag(snapshot, tag);
    }
    updated
}

fn read_snapshot_with_symphonia(path: &Path) -> Option<TagSnapshot> {
    let mut probed = open_symphonia_probe(path)?;
    let mut snapshot = TagSnapshot::default();

    if let Some(probe_meta) = probed.metadata.get() {
        if let Some(revision) = probe_meta.current() {
            let _ = apply_symphonia_revision(&mut snapshot, revision);
        }
    }

    while !probed.format.metadata().is_latest() {
        let _ = probed.format.metadata().pop();
    }
    if let Some(revision) = probed.format.metadata().current() {
        let _ = apply_symphonia_revision(&mut snapshot, revision);
    }

    if snapshot.has_any_value() {
        Some(snapshot)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("tagsmith_{name}_{nonce}.{extension}"))
    }

    fn write_mp3_with_large_junk_gap(path: &PathBuf, junk_bytes: usize) {
        let mut bytes = Vec::new();
        // ID3v2.3 header with payload size 0x23 (35 bytes)
        bytes.extend_from_slice(&[0x49, 0x44, 0x33, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x23]);
        // TALB frame content (UTF-16LE "aaaaaaaaaaa")
        bytes.extend_from_slice(&[
            0x54, 0x41, 0x4C, 0x42, 0x00, 0x00, 0x00, 0x19, 0x00, 0x00, 0x01, 0xFF, 0xFE, 0x61,
            0x00, 0x61, 0x00, 0x61, 0x00, 0x61, 0x00, 0x61, 0x00, 0x61, 0x00, 0x61, 0x00, 0x61,
            0x00, 0x61, 0x00, 0x61, 0x00, 0x61, 0x00,
        ]);
        bytes.extend(std::iter::repeat_n(0x20, junk_bytes));
        // Start of an MPEG frame (minimal bytes, enough for tag reader context)
        bytes.extend_from_slice(&[
            0xFF, 0xFB, 0x50, 0xC4, 0x00, 0x03, 0xC0, 0x00, 0x01, 0xA4, 0x00, 0x00, 0x00, 0x20,
            0x00, 0x00, 0x34, 0x80, 0x00, 0x00, 0x04,
        ]);

        fs::write(path, bytes).expect("should write mp3 fixture");
    }

    // Canonical PCM WAV: fmt chunk (mono, 8 kHz, 8-bit) plus 16 silence bytes.
    fn write_minimal_wav(path: &PathBuf) {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&52u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);

        fs::write(path, bytes).expect("should write wav fixture");
    }

    #[test]
    fn test_track_total_suffix_is_dropped() {
        assert_eq!(truncate_track_at_total("3/12"), "3");
        assert_eq!(truncate_track_at_total("7"), "7");
        assert_eq!(truncate_track_at_total("4 / 10"), "4");
    }

    #[test]
    fn test_read_survives_large_junk_gap() {
        let path = unique_temp_path("large_junk_gap", "mp3");
        write_mp3_with_large_junk_gap(&path, 4_096);

        let store = LoftyTagStore::new();
        let snapshot = store
            .read(&path)
            .expect("tags should be readable with relaxed fallback parsing");
        assert!(
            !snapshot.album.is_empty(),
            "album from TALB frame should be parsed"
        );

        fs::remove_file(path).expect("fixture should be removable");
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let path = unique_temp_path("roundtrip", "wav");
        write_minimal_wav(&path);

        let store = LoftyTagStore::new();
        store
            .write(
                &path,
                &[
                    (TagField::Title, Some("My Song".to_string())),
                    (TagField::Artist, Some("IU".to_string())),
                    (TagField::Track, Some("7".to_string())),
                ],
            )
            .expect("tags should be writable");

        let snapshot = store.read(&path).expect("written tags should be readable");
        assert_eq!(snapshot.title, "My Song");
        assert_eq!(snapshot.artist, "IU");
        assert_eq!(snapshot.track, "7");

        fs::remove_file(path).expect("fixture should be removable");
    }

    #[test]
    fn test_write_with_none_removes_the_field() {
        let path = unique_temp_path("field_removal", "wav");
        write_minimal_wav(&path);

        let store = LoftyTagStore::new();
        store
            .write(
                &path,
                &[
                    (TagField::Title, Some("My Song".to_string())),
                    (TagField::Genre, Some("Pop".to_string())),
                ],
            )
            .expect("tags should be writable");
        store
            .write(&path, &[(TagField::Genre, None)])
            .expect("field removal should be writable");

        let snapshot = store.read(&path).expect("written tags should be readable");
        assert_eq!(snapshot.title, "My Song");
        assert!(snapshot.genre.is_empty());

        fs::remove_file(path).expect("fixture should be removable");
    }

    #[test]
    fn test_missing_file_read_is_an_error() {
        let store = LoftyTagStore::new();
        let path = std::env::temp_dir().join("tagsmith_read_missing_nonexistent.mp3");
        assert!(store.read(&path).is_err());
    }
}
