//! MusicBrainz recording search client.
//!
//! Wraps the ws/2 recording endpoint behind the `RemoteLookup` trait so the
//! lookup runtime can be driven without network access in tests.

use std::io::Read;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use governor::state::NotKeyed;
use governor::{Quota, RateLimiter};
use log::debug;
use serde_json::Value;

use crate::config::LookupConfig;
use crate::protocol::SearchCandidate;

const MUSICBRAINZ_RECORDING_URL: &str = "https://musicbrainz.org/ws/2/recording/";
const MUSICBRAINZ_USER_AGENT: &str =
    "tagsmith/0.1.0 (https://github.com/tagsmith/tagsmith; contact: tag synchronization)";
/// The catalog allows one request per second for anonymous clients.
const REQUEST_PERIOD: Duration = Duration::from_secs(1);
const RATE_LIMIT_WAIT_CAP: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HttpFailureKind {
    Timeout,
    RateLimited,
    Hard,
}

/// Remote recording catalog access.
pub trait RemoteLookup: Send {
    fn search(
        &self,
        artist: &str,
        title: &str,
        limit: u32,
    ) -> Result<Vec<SearchCandidate>, String>;
}

/// The production client.
pub struct MusicBrainzClient {
    http_client: ureq::Agent,
    limiter: RateLimiter<NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
    request_timeout: Duration,
}

impl MusicBrainzClient {
    pub fn new(config: &LookupConfig) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(7))
            .timeout_write(Duration::from_secs(7))
            .build();

        Self {
            http_client,
            limiter: RateLimiter::direct(
                Quota::with_period(REQUEST_PERIOD)
                    .expect("valid limiter period")
                    .allow_burst(NonZeroU32::new(1).expect("non-zero limiter burst")),
            ),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn classify_ureq_failure(error: &ureq::Error) -> HttpFailureKind {
        match error {
            ureq::Error::Status(code, _) => match code {
                429 => HttpFailureKind::RateLimited,
                408 | 500 | 502 | 503 | 504 => HttpFailureKind::Timeout,
                _ => HttpFailureKind::Hard,
            },
            ureq::Error::Transport(transport) => {
                let lowered = transport.to_string().to_ascii_lowercase();
                if lowered.contains("timed out") || lowered.contains("timeout") {
                    HttpFailureKind::Timeout
                } else {
                    HttpFailureKind::Hard
                }
            }
        }
    }

    fn wait_for_rate_limit_slot(&self) {
        if self.limiter.check().is_ok() {
            return;
        }

        let deadline = Instant::now() + RATE_LIMIT_WAIT_CAP;
        while Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(100));
            if self.limiter.check().is_ok() {
                return;
            }
        }
        debug!("MusicBrainzClient: rate limit wait cap reached, continuing");
    }

    fn http_get_json(&self, url: &str) -> Result<Value, String> {
        let response = self
            .http_client
            .get(url)
            .set("User-Agent", MUSICBRAINZ_USER_AGENT)
            .set("Accept", "application/json")
            .timeout(self.request_timeout)
            .call()
            .map_err(|error| match Self::classify_ureq_failure(&error) {
                HttpFailureKind::Timeout => format!("MusicBrainz request timed out: {error}"),
                HttpFailureKind::RateLimited => format!("MusicBrainz rate limit hit: {error}"),
                HttpFailureKind::Hard => format!("MusicBrainz request failed: {error}"),
            })?;

        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|error| format!("Failed to read MusicBrainz response: {error}"))?;
        serde_json::from_str(&body)
            .map_err(|error| format!("Invalid JSON in MusicBrainz response: {error}"))
    }
}

impl RemoteLookup for MusicBrainzClient {
    fn search(
        &self,
        artist: &str,
        title: &str,
        limit: u32,
    ) -> Result<Vec<SearchCandidate>, String> {
        let query = build_recording_query(artist, title);
        let url = format!(
            "{MUSICBRAINZ_RECORDING_URL}?query={}&fmt=json&limit={limit}",
            urlencoding::encode(&query)
        );

        self.wait_for_rate_limit_slot();
        let payload = self.http_get_json(&url)?;
        let mut candidates = extract_candidates(&payload);
        candidates.truncate(limit as usize);
        Ok(candidates)
    }
}

/// Builds the lucene query for one recording. Double quotes inside the values
/// would terminate the phrase early, so they are dropped.
fn build_recording_query(artist: &str, title: &str) -> String {
    let artist = artist.replace('"', "");
    let title = title.replace('"', "");
    format!("artist:\"{artist}\" AND recording:\"{title}\"")
}

fn joined_artist_credit(recording: &Value) -> Option<String> {
    let credits = recording.get("artist-credit")?.as_array()?;
    let mut joined = String::new();
    for credit in credits {
        if let Some(name) = credit.get("name").and_then(Value::as_str) {
            joined.push_str(name);
        }
        if let Some(phrase) = credit.get("joinphrase").and_then(Value::as_str) {
            joined.push_str(phrase);
        }
    }
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn release_year(release: &Value) -> Option<String> {
    let date = release.get("date").and_then(Value::as_str)?;
    Some(date.get(..4)?.to_string())
}

/// The recording's position on the release, read from the first medium's
/// track list. This is the track number, never the medium's track count.
fn release_track_position(release: &Value) -> Option<String> {
    let media = release.get("media")?.as_array()?;
    let medium = media.first()?;
    let tracks = medium
        .get("track")
        .or_else(|| medium.get("tracks"))?
        .as_array()?;
    let number = tracks.first()?.get("number")?.as_str()?;
    let trimmed = number.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Converts a ws/2 recording search payload into candidates. Fields the
/// payload lacks come back as `None`.
pub fn extract_candidates(payload: &Value) -> Vec<SearchCandidate> {
    let Some(recordings) = payload.get("recordings").and_then(Value::as_array) else {
        return Vec::new();
    };

    recordings
        .iter()
        .map(|recording| {
            let title = recording
                .get("title")
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or("-")
                .to_string();
            let first_release = recording
                .get("releases")
                .and_then(Value::as_array)
                .and_then(|releases| releases.first());

            let album = first_release
                .and_then(|release| release.get("title"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let year = first_release.and_then(release_year);
            let track = first_release.and_then(release_track_position);

            SearchCandidate {
                title,
                artist: joined_artist_credit(recording),
                album,
                year,
                track,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_drops_embedded_quotes() {
        let query = build_recording_query("IU \"the\" great", "Love wins all");
        assert_eq!(query, "artist:\"IU the great\" AND recording:\"Love wins all\"");
    }

    #[test]
    fn test_extract_full_candidate() {
        let payload = json!({
            "recordings": [{
                "title": "Love wins all",
                "artist-credit": [
                    { "name": "IU", "joinphrase": " feat. " },
                    { "name": "V" }
                ],
                "releases": [{
                    "title": "The Winning",
                    "date": "2024-01-24",
                    "media": [{
                        "track-count": 6,
                        "track": [{ "number": "2" }]
                    }]
                }]
            }]
        });

        let candidates = extract_candidates(&payload);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.title, "Love wins all");
        assert_eq!(candidate.artist.as_deref(), Some("IU feat. V"));
        assert_eq!(candidate.album.as_deref(), Some("The Winning"));
        assert_eq!(candidate.year.as_deref(), Some("2024"));
        assert_eq!(candidate.track.as_deref(), Some("2"));
    }

    #[test]
    fn test_track_is_the_position_not_the_count() {
        let payload = json!({
            "recordings": [{
                "title": "Blueming",
                "releases": [{
                    "title": "Love poem",
                    "media": [{
                        "track-count": 6,
                        "track": [{ "number": "4" }]
                    }]
                }]
            }]
        });

        let candidates = extract_candidates(&payload);
        assert_eq!(candidates[0].track.as_deref(), Some("4"));
    }

    #[test]
    fn test_missing_release_yields_bare_candidate() {
        let payload = json!({
            "recordings": [{ "title": "Demo take" }]
        });

        let candidates = extract_candidates(&payload);
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.title, "Demo take");
        assert_eq!(candidate.artist, None);
        assert_eq!(candidate.album, None);
        assert_eq!(candidate.year, None);
        assert_eq!(candidate.track, None);
    }

    #[test]
    fn test_short_date_yields_no_year() {
        let payload = json!({
            "recordings": [{
                "title": "Night Letter",
                "releases": [{ "title": "Palette", "date": "202" }]
            }]
        });

        let candidates = extract_candidates(&payload);
        assert_eq!(candidates[0].year, None);
    }

    #[test]
    fn test_untitled_recording_displays_placeholder() {
        let payload = json!({
            "recordings": [{ "title": "  " }]
        });

        let candidates = extract_candidates(&payload);
        assert_eq!(candidates[0].title, "-");
    }

    #[test]
    fn test_payload_without_recordings_is_empty() {
        assert!(extract_candidates(&json!({})).is_empty());
        assert!(extract_candidates(&json!({ "recordings": null })).is_empty());
    }
}
