//! Metadata synchronization engine for audio file collections.
//!
//! Brings a folder of audio files' embedded tags and on-disk filenames into
//! agreement, optionally reconciled against the MusicBrainz catalog. The
//! embedding shell talks to two runtime components over a broadcast bus:
//! [`sync_manager::SyncManager`] owns the file records and applies batches on
//! its own thread, [`lookup_manager::LookupManager`] serves blocking catalog
//! lookups on a worker thread. All payloads live in [`protocol`].

pub mod candidate_reconciler;
pub mod config;
pub mod field_history;
pub mod field_normalizer;
pub mod fields;
pub mod file_record_store;
pub mod filename_composer;
pub mod lookup_manager;
pub mod media_file_discovery;
pub mod musicbrainz_lookup;
pub mod protocol;
pub mod sync_manager;
pub mod tag_store;
pub mod text_integrity;
pub mod title_parser;

pub use config::{EngineConfig, RenamePolicy};
pub use fields::{EditFieldSet, FieldValue, TagField};
pub use lookup_manager::LookupManager;
pub use musicbrainz_lookup::{MusicBrainzClient, RemoteLookup};
pub use protocol::{LookupMessage, Message, SyncMessage};
pub use sync_manager::SyncManager;
pub use tag_store::{LoftyTagStore, TagStore};
