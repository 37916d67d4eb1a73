//! Path-keyed store of per-file tag records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;

use crate::fields::TagField;
use crate::media_file_discovery::collect_audio_files_from_folder;
use crate::protocol::FileRecordSnapshot;
use crate::tag_store::{TagSnapshot, TagStore};
use crate::text_integrity;

/// One audio file's last-read tag state plus its display projections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub tags: TagSnapshot,
    pub display_title: String,
    pub display_bitrate: String,
}

impl FileRecord {
    pub fn value(&self, field: TagField) -> &str {
        self.tags.value(field)
    }

    pub fn snapshot(&self) -> FileRecordSnapshot {
        FileRecordSnapshot {
            path: self.path.clone(),
            title: self.tags.title.clone(),
            artist: self.tags.artist.clone(),
            album_artist: self.tags.album_artist.clone(),
            track: self.tags.track.clone(),
            album: self.tags.album.clone(),
            genre: self.tags.genre.clone(),
            date: self.tags.date.clone(),
            display_title: self.display_title.clone(),
            display_bitrate: self.display_bitrate.clone(),
        }
    }
}

/// Record collection keyed by file path, with a remembered scan folder.
/// Records change only through an explicit refresh; batch operations never
/// mutate them in place.
#[derive(Debug, Default)]
pub struct FileRecordStore {
    folder: Option<PathBuf>,
    records: BTreeMap<PathBuf, FileRecord>,
}

impl FileRecordStore {
    pub fn new() -> Self {
        Self {
            folder: None,
            records: BTreeMap::new(),
        }
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Rescans `folder` and replaces every record. Files whose tags cannot be
    /// read are logged and left out.
    pub fn refresh(&mut self, folder: &Path, tag_store: &dyn TagStore) {
        self.folder = Some(folder.to_path_buf());
        self.reload(tag_store);
    }

    /// Rescans the remembered folder, if one was set.
    pub fn reload(&mut self, tag_store: &dyn TagStore) {
        let Some(folder) = self.folder.clone() else {
            return;
        };

        self.records.clear();
        for path in collect_audio_files_from_folder(&folder) {
            match tag_store.read(&path) {
                Ok(tags) => {
                    let record = build_record(path, tags);
                    self.records.insert(record.path.clone(), record);
                }
                Err(error) => {
                    warn!(
                        "FileRecordStore: skipping unreadable file {}: {}",
                        path.display(),
                        error
                    );
                }
            }
        }
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshots of every record in path order.
    pub fn snapshots(&self) -> Vec<FileRecordSnapshot> {
        self.records.values().map(FileRecord::snapshot).collect()
    }
}

fn build_record(path: PathBuf, tags: TagSnapshot) -> FileRecord {
    let display_title = text_integrity::display_title(&tags.title, &path);
    let display_bitrate = tags
        .bitrate_kbps
        .map(|kbps| format!("{kbps}k"))
        .unwrap_or_default();
    FileRecord {
        path,
        tags,
        display_title,
        display_bitrate,
    }
}
