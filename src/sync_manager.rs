//! Batch synchronization runtime component.
//!
//! This manager owns the file record store and the field history. It applies
//! edit sets to audio files, keeps filenames aligned with tag values, and
//! republishes the store after every mutation.

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};

use crate::candidate_reconciler;
use crate::config::{EngineConfig, RenamePolicy};
use crate::field_history::FieldHistory;
use crate::field_normalizer;
use crate::fields::{EditFieldSet, FieldValue, TagField};
use crate::file_record_store::FileRecordStore;
use crate::filename_composer;
use crate::protocol::{
    BatchResult, FileRecordSnapshot, LookupMessage, Message, SearchCandidate, SyncMessage,
};
use crate::tag_store::TagStore;

enum FileOutcome {
    Applied,
    Skipped,
}

/// Applies batches against the filesystem and serves store and history state.
pub struct SyncManager {
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    tag_store: Box<dyn TagStore>,
    store: FileRecordStore,
    history: FieldHistory,
    rename_policy: RenamePolicy,
}

impl SyncManager {
    /// Creates a sync manager bound to bus channels and a tag backend.
    pub fn new(
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
        tag_store: Box<dyn TagStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            bus_consumer,
            bus_producer,
            tag_store,
            store: FileRecordStore::new(),
            history: FieldHistory::new(),
            rename_policy: config.sync.rename_policy,
        }
    }

    fn publish_store(&self) {
        let _ = self
            .bus_producer
            .send(Message::Sync(SyncMessage::StoreRefreshed {
                records: self.store.snapshots(),
            }));
    }

    fn reload_and_publish(&mut self) {
        self.store.reload(self.tag_store.as_ref());
        self.publish_store();
    }

    /// Tag deltas an edit set produces for one file. Track values are
    /// integer-normalized and withheld entirely under multi-select, since a
    /// shared position number is wrong for every file but one.
    fn edit_deltas(edits: &EditFieldSet, multi_select: bool) -> Vec<(TagField, Option<String>)> {
        let mut deltas = Vec::new();
        for field in TagField::ALL {
            match edits.get(field) {
                FieldValue::Unset => {}
                FieldValue::Clear => deltas.push((field, None)),
                FieldValue::Value(text) => {
                    if field == TagField::Track {
                        if multi_select {
                            continue;
                        }
                        if let Some(minimal) = field_normalizer::tag_form(text) {
                            deltas.push((field, Some(minimal)));
                        }
                    } else {
                        deltas.push((field, Some(text.clone())));
                    }
                }
            }
        }
        deltas
    }

    fn apply_batch(
        &mut self,
        targets: &[PathBuf],
        edits: &EditFieldSet,
    ) -> Result<BatchResult, String> {
        if targets.is_empty() {
            return Err("No files selected".to_string());
        }
        let multi_select = targets.len() > 1;
        if multi_select && !edits.title.is_unset() {
            return Err("Cannot write one title to multiple files".to_string());
        }

        let mut result = BatchResult::default();
        for path in targets {
            match self.apply_to_file(path, edits, multi_select) {
                Ok(()) => result.succeeded += 1,
                Err(reason) => {
                    error!(
                        "SyncManager: batch step failed for {}: {}",
                        path.display(),
                        reason
                    );
                    result.record_failure(path, reason);
                }
            }
        }

        for field in TagField::ALL {
            if let FieldValue::Value(text) = edits.get(field) {
                self.history.record(field, text);
            }
        }

        Ok(result)
    }

    fn apply_to_file(
        &self,
        path: &Path,
        edits: &EditFieldSet,
        multi_select: bool,
    ) -> Result<(), String> {
        if !path.exists() {
            return Err("File not found".to_string());
        }

        let deltas = Self::edit_deltas(edits, multi_select);
        if !deltas.is_empty() {
            self.tag_store.write(path, &deltas)?;
        }

        self.rename_after_edit(path, edits)
    }

    /// Renames a file when the batch supplied both artist and title. A name
    /// identical to the current one is a no-op; a taken name is a failure.
    fn rename_after_edit(&self, path: &Path, edits: &EditFieldSet) -> Result<(), String> {
        let (FieldValue::Value(artist), FieldValue::Value(title)) =
            (edits.get(TagField::Artist), edits.get(TagField::Title))
        else {
            debug!(
                "SyncManager: rename skipped for {}: artist and title edits are required",
                path.display()
            );
            return Ok(());
        };
        if !(filename_composer::is_usable_name_part(artist)
            && filename_composer::is_usable_name_part(title))
        {
            debug!(
                "SyncManager: rename skipped for {}: artist or title is a placeholder",
                path.display()
            );
            return Ok(());
        }

        let track_part = match edits.get(TagField::Track) {
            FieldValue::Value(text) => field_normalizer::filename_form(text),
            _ => field_normalizer::filename_form(""),
        };
        let new_name = filename_composer::compose(
            artist,
            &track_part,
            title,
            &file_extension_suffix(path),
        );

        let current_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if new_name == current_name {
            return Ok(());
        }

        let folder = path
            .parent()
            .ok_or_else(|| "File has no parent folder".to_string())?;
        let target = folder.join(&new_name);
        if target.exists() {
            return Err(format!("Target filename already exists: {new_name}"));
        }

        std::fs::rename(path, &target).map_err(|error| format!("Failed to rename: {error}"))?;
        info!("SyncManager: renamed {} -> {}", path.display(), new_name);
        Ok(())
    }

    fn rename_batch(&mut self, targets: &[PathBuf]) -> Result<BatchResult, String> {
        if targets.is_empty() {
            return Err("No files selected".to_string());
        }

        let mut result = BatchResult::default();
        for path in targets {
            match self.rename_from_record(path) {
                Ok(FileOutcome::Applied) => result.succeeded += 1,
                Ok(FileOutcome::Skipped) => result.skipped += 1,
                Err(reason) => {
                    error!(
                        "SyncManager: rename failed for {}: {}",
                        path.display(),
                        reason
                    );
                    result.record_failure(path, reason);
                }
            }
        }
        Ok(result)
    }

    /// Rebuilds one filename from its record's values. Collisions resolve
    /// through a numbered suffix against the live directory.
    fn rename_from_record(&self, path: &Path) -> Result<FileOutcome, String> {
        let record = self
            .store
            .get(path)
            .ok_or_else(|| "File is not part of the current folder view".to_string())?;
        if !path.exists() {
            return Err("File not found".to_string());
        }

        let Some((artist_part, title_part)) = filename_composer::name_parts_for(
            self.rename_policy,
            &record.tags.artist,
            &record.display_title,
        ) else {
            debug!(
                "SyncManager: rename skipped for {}: missing artist or title",
                path.display()
            );
            return Ok(FileOutcome::Skipped);
        };

        let track_part = field_normalizer::filename_form(&record.tags.track);
        let composed = filename_composer::compose(
            &artist_part,
            &track_part,
            &title_part,
            &file_extension_suffix(path),
        );

        let current_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if composed == current_name {
            return Ok(FileOutcome::Applied);
        }

        let folder = path
            .parent()
            .ok_or_else(|| "File has no parent folder".to_string())?;
        let unique_name = filename_composer::resolve_collision(folder, &composed);
        std::fs::rename(path, folder.join(&unique_name))
            .map_err(|error| format!("Failed to rename: {error}"))?;
        info!(
            "SyncManager: renamed {} -> {}",
            path.display(),
            unique_name
        );
        Ok(FileOutcome::Applied)
    }

    fn delete_batch(&mut self, targets: &[PathBuf]) -> Result<BatchResult, String> {
        if targets.is_empty() {
            return Err("No files selected".to_string());
        }

        let mut result = BatchResult::default();
        for path in targets {
            match self.delete_file(path) {
                Ok(()) => result.succeeded += 1,
                Err(reason) => {
                    error!(
                        "SyncManager: delete failed for {}: {}",
                        path.display(),
                        reason
                    );
                    result.record_failure(path, reason);
                }
            }
        }
        Ok(result)
    }

    fn delete_file(&self, path: &Path) -> Result<(), String> {
        if !path.exists() {
            return Err("File not found".to_string());
        }
        std::fs::remove_file(path).map_err(|error| format!("Failed to delete: {error}"))?;
        info!("SyncManager: deleted {}", path.display());
        Ok(())
    }

    fn copy_artist_batch(&mut self, targets: &[PathBuf]) -> Result<BatchResult, String> {
        if targets.is_empty() {
            return Err("No files selected".to_string());
        }

        let mut result = BatchResult::default();
        for path in targets {
            match self.copy_artist_for(path) {
                Ok(FileOutcome::Applied) => result.succeeded += 1,
                Ok(FileOutcome::Skipped) => result.skipped += 1,
                Err(reason) => {
                    error!(
                        "SyncManager: artist copy failed for {}: {}",
                        path.display(),
                        reason
                    );
                    result.record_failure(path, reason);
                }
            }
        }
        Ok(result)
    }

    /// Copies a file's artist into its album-artist tag. The record value is
    /// preferred; files outside the store are read directly.
    fn copy_artist_for(&self, path: &Path) -> Result<FileOutcome, String> {
        let recorded = self.store.get(path).map(|record| record.tags.artist.clone());
        let artist = match recorded {
            Some(artist) if filename_composer::is_usable_name_part(&artist) => artist,
            Some(_) => {
                debug!(
                    "SyncManager: no artist to copy for {}",
                    path.display()
                );
                return Ok(FileOutcome::Skipped);
            }
            None => {
                let artist = self.tag_store.read(path)?.artist;
                if !filename_composer::is_usable_name_part(&artist) {
                    return Ok(FileOutcome::Skipped);
                }
                artist
            }
        };

        self.tag_store
            .write(path, &[(TagField::AlbumArtist, Some(artist))])?;
        Ok(FileOutcome::Applied)
    }

    fn stage_and_publish(
        &self,
        candidate: &SearchCandidate,
        current: &FileRecordSnapshot,
        chosen: bool,
    ) {
        let updates = candidate_reconciler::stage_candidate(candidate, current, chosen);
        let _ = self
            .bus_producer
            .send(Message::Sync(SyncMessage::EditsStaged {
                path: current.path.clone(),
                updates,
            }));
    }

    /// Starts the blocking event loop for batch synchronization operations.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(Message::Sync(SyncMessage::RefreshStore { folder })) => {
                    debug!("SyncManager: refreshing store from {}", folder.display());
                    self.store.refresh(&folder, self.tag_store.as_ref());
                    self.publish_store();
                }
                Ok(Message::Sync(SyncMessage::ApplyBatch { targets, edits })) => {
                    info!("SyncManager: applying batch to {} file(s)", targets.len());
                    match self.apply_batch(&targets, &edits) {
                        Ok(result) => {
                            self.reload_and_publish();
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchCompleted { result }));
                        }
                        Err(reason) => {
                            warn!("SyncManager: batch rejected: {reason}");
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchRejected { reason }));
                        }
                    }
                }
                Ok(Message::Sync(SyncMessage::RenameFromRecords { targets })) => {
                    info!("SyncManager: renaming {} file(s) from records", targets.len());
                    match self.rename_batch(&targets) {
                        Ok(result) => {
                            self.reload_and_publish();
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchCompleted { result }));
                        }
                        Err(reason) => {
                            warn!("SyncManager: rename batch rejected: {reason}");
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchRejected { reason }));
                        }
                    }
                }
                Ok(Message::Sync(SyncMessage::DeleteFiles { targets })) => {
                    info!("SyncManager: deleting {} file(s)", targets.len());
                    match self.delete_batch(&targets) {
                        Ok(result) => {
                            self.reload_and_publish();
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::DeleteCompleted { result }));
                        }
                        Err(reason) => {
                            warn!("SyncManager: delete batch rejected: {reason}");
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchRejected { reason }));
                        }
                    }
                }
                Ok(Message::Sync(SyncMessage::CopyArtistToAlbumArtist { targets })) => {
                    info!(
                        "SyncManager: copying artist to album artist for {} file(s)",
                        targets.len()
                    );
                    match self.copy_artist_batch(&targets) {
                        Ok(result) => {
                            self.reload_and_publish();
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchCompleted { result }));
                        }
                        Err(reason) => {
                            warn!("SyncManager: artist copy batch rejected: {reason}");
                            let _ = self
                                .bus_producer
                                .send(Message::Sync(SyncMessage::BatchRejected { reason }));
                        }
                    }
                }
                Ok(Message::Sync(SyncMessage::RequestHistory { field })) => {
                    let _ = self
                        .bus_producer
                        .send(Message::Sync(SyncMessage::HistoryValues {
                            field,
                            values: self.history.values(field).to_vec(),
                        }));
                }
                Ok(Message::Sync(SyncMessage::StageCandidate {
                    candidate,
                    current,
                    chosen,
                })) => {
                    self.stage_and_publish(&candidate, &current, chosen);
                }
                Ok(Message::Lookup(LookupMessage::SearchCompleted {
                    request_id,
                    candidates,
                    current,
                })) if candidates.len() == 1 => {
                    debug!(
                        "SyncManager: auto-staging the only search result request_id={}",
                        request_id
                    );
                    self.stage_and_publish(&candidates[0], &current, false);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "SyncManager lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn file_extension_suffix(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
