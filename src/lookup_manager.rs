//! Remote lookup runtime component.
//!
//! Serves interactive catalog searches and background batch scans over the
//! message bus. Every reply carries the request context back to the caller so
//! stale responses can be discarded.

use log::{debug, error, info, warn};
use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};

use crate::candidate_reconciler;
use crate::config::EngineConfig;
use crate::musicbrainz_lookup::RemoteLookup;
use crate::protocol::{FileRecordSnapshot, LookupMessage, Message, ScanRow};

/// Resolves catalog lookups requested over the bus.
pub struct LookupManager {
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    lookup: Box<dyn RemoteLookup>,
    search_limit: u32,
}

impl LookupManager {
    /// Creates a lookup manager bound to bus channels and a lookup backend.
    pub fn new(
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
        lookup: Box<dyn RemoteLookup>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            bus_consumer,
            bus_producer,
            lookup,
            search_limit: config.lookup.search_limit,
        }
    }

    fn handle_search(
        &self,
        request_id: u64,
        artist: &str,
        title: &str,
        current: FileRecordSnapshot,
    ) {
        let artist = artist.trim();
        let title = title.trim();
        if artist.is_empty() || title.is_empty() {
            warn!("LookupManager: search {request_id} rejected: artist and title are required");
            let _ = self
                .bus_producer
                .send(Message::Lookup(LookupMessage::SearchFailed {
                    request_id,
                    error: "Artist and title are required for lookup".to_string(),
                }));
            return;
        }

        match self.lookup.search(artist, title, self.search_limit) {
            Ok(candidates) if candidates.is_empty() => {
                debug!("LookupManager: search {request_id} found no matches");
                let _ = self
                    .bus_producer
                    .send(Message::Lookup(LookupMessage::SearchEmpty { request_id }));
            }
            Ok(candidates) => {
                debug!(
                    "LookupManager: search {request_id} found {} candidate(s)",
                    candidates.len()
                );
                let _ = self
                    .bus_producer
                    .send(Message::Lookup(LookupMessage::SearchCompleted {
                        request_id,
                        candidates,
                        current,
                    }));
            }
            Err(error) => {
                error!("LookupManager: search {request_id} failed: {error}");
                let _ = self
                    .bus_producer
                    .send(Message::Lookup(LookupMessage::SearchFailed {
                        request_id,
                        error,
                    }));
            }
        }
    }

    /// Looks up the top catalog match for each row and reports whether it
    /// disagrees with the row's stored values. Rows without both artist and
    /// title, and rows whose lookup fails, are passed over.
    fn handle_batch_scan(&self, rows: Vec<ScanRow>) {
        info!("LookupManager: scanning {} row(s)", rows.len());
        for row in rows {
            let artist = row.artist.trim();
            let title = row.title.trim();
            if artist.is_empty() || title.is_empty() {
                debug!(
                    "LookupManager: scan skipped for {}: missing artist or title",
                    row.path.display()
                );
                continue;
            }

            let candidates = match self.lookup.search(artist, title, 1) {
                Ok(candidates) => candidates,
                Err(error) => {
                    debug!(
                        "LookupManager: scan lookup failed for {}: {}",
                        row.path.display(),
                        error
                    );
                    continue;
                }
            };
            let Some(candidate) = candidates.into_iter().next() else {
                debug!(
                    "LookupManager: scan found no match for {}",
                    row.path.display()
                );
                continue;
            };

            let different = candidate_reconciler::candidate_differs(&row, &candidate);
            let _ = self
                .bus_producer
                .send(Message::Lookup(LookupMessage::ScanRowCompleted {
                    path: row.path,
                    candidate,
                    different,
                }));
        }
    }

    /// Starts the blocking event loop for lookup requests.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(Message::Lookup(LookupMessage::Search {
                    request_id,
                    artist,
                    title,
                    current,
                })) => {
                    self.handle_search(request_id, &artist, &title, current);
                }
                Ok(Message::Lookup(LookupMessage::BatchScan { rows })) => {
                    self.handle_batch_scan(rows);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "LookupManager lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
