//! Event-bus protocol shared by all runtime components.
//!
//! This module defines the message payloads exchanged between batch
//! synchronization, remote catalog lookup, and the embedding shell.

use std::path::{Path, PathBuf};

use crate::fields::{EditFieldSet, TagField};

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Sync(SyncMessage),
    Lookup(LookupMessage),
}

/// One file's tag state as shared across the bus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecordSnapshot {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub track: String,
    pub album: String,
    pub genre: String,
    pub date: String,
    /// Title safe to render: falls back to the file stem when the stored
    /// title is garbled or missing.
    pub display_title: String,
    /// Bitrate formatted for display, e.g. "320k". Empty when unknown.
    pub display_bitrate: String,
}

impl FileRecordSnapshot {
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
}

/// Outcome counts for one batch operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub succeeded: usize,
    pub skipped: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchResult {
    pub fn record_failure(&mut self, path: &Path, reason: String) {
        self.failures.push(BatchFailure {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// One file that could not be processed, with the cause.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// One remote catalog match. Fields the catalog did not supply are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCandidate {
    /// Recording title as listed by the catalog, for display.
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub track: Option<String>,
}

/// Current values of one file used by the batch scan to spot divergence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRow {
    pub path: PathBuf,
    pub artist: String,
    pub title: String,
    pub album: String,
    pub date: String,
    pub track: String,
}

/// Batch synchronization commands and notifications.
#[derive(Debug, Clone)]
pub enum SyncMessage {
    /// Rebuild the record store from the audio files under a folder.
    RefreshStore {
        folder: PathBuf,
    },
    StoreRefreshed {
        records: Vec<FileRecordSnapshot>,
    },
    /// Apply one edit set to every target file.
    ApplyBatch {
        targets: Vec<PathBuf>,
        edits: EditFieldSet,
    },
    /// Rebuild filenames from the values already stored in the records.
    RenameFromRecords {
        targets: Vec<PathBuf>,
    },
    DeleteFiles {
        targets: Vec<PathBuf>,
    },
    /// Copy each file's artist into its album-artist tag.
    CopyArtistToAlbumArtist {
        targets: Vec<PathBuf>,
    },
    /// The batch violated a pre-check and no file was touched.
    BatchRejected {
        reason: String,
    },
    BatchCompleted {
        result: BatchResult,
    },
    DeleteCompleted {
        result: BatchResult,
    },
    RequestHistory {
        field: TagField,
    },
    HistoryValues {
        field: TagField,
        values: Vec<String>,
    },
    /// Gate a chosen catalog candidate against a file's current values.
    StageCandidate {
        candidate: SearchCandidate,
        current: FileRecordSnapshot,
        chosen: bool,
    },
    /// Field updates that passed the gate, ready for the edit surface.
    EditsStaged {
        path: PathBuf,
        updates: Vec<(TagField, String)>,
    },
}

/// Remote catalog lookup commands and notifications.
#[derive(Debug, Clone)]
pub enum LookupMessage {
    /// Search the catalog for one file's recording.
    Search {
        request_id: u64,
        artist: String,
        title: String,
        current: FileRecordSnapshot,
    },
    SearchCompleted {
        request_id: u64,
        candidates: Vec<SearchCandidate>,
        current: FileRecordSnapshot,
    },
    SearchEmpty {
        request_id: u64,
    },
    SearchFailed {
        request_id: u64,
        error: String,
    },
    /// Check many files against the catalog's top match.
    BatchScan {
        rows: Vec<ScanRow>,
    },
    ScanRowCompleted {
        path: PathBuf,
        candidate: SearchCandidate,
        different: bool,
    },
}
