//! Filesystem discovery of taggable audio files.

use std::path::{Path, PathBuf};

use log::debug;

/// Extensions the tag layer can read and write.
pub const SUPPORTED_AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "flac", "m4a", "ogg", "wma", "wav"];

pub fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|supported| extension.eq_ignore_ascii_case(supported))
        })
}

/// Walks `folder_path` and returns every supported audio file, sorted by
/// full path so refreshes produce a stable order. Unreadable directories
/// and entries are logged and skipped.
pub fn collect_audio_files_from_folder(folder_path: &Path) -> Vec<PathBuf> {
    let mut pending_directories = vec![folder_path.to_path_buf()];
    let mut files = Vec::new();

    while let Some(directory) = pending_directories.pop() {
        let entries = match std::fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(error) => {
                debug!(
                    "Folder scan: failed to read {}: {}",
                    directory.display(),
                    error
                );
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    debug!(
                        "Folder scan: failed to read an entry in {}: {}",
                        directory.display(),
                        error
                    );
                    continue;
                }
            };

            let path = entry.path();
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => pending_directories.push(path),
                Ok(file_type) if file_type.is_file() && is_supported_audio_file(&path) => {
                    files.push(path);
                }
                Ok(_) => {}
                Err(error) => {
                    debug!("Folder scan: failed to inspect {}: {}", path.display(), error)
                }
            }
        }
    }

    files.sort_unstable();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after the epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("tagsmith_{name}_{nonce}"));
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn test_extension_match_ignores_case() {
        assert!(is_supported_audio_file(Path::new("music/track.MP3")));
        assert!(is_supported_audio_file(Path::new("music/track.FlAc")));
        assert!(is_supported_audio_file(Path::new("music/track.wma")));
        assert!(!is_supported_audio_file(Path::new("music/track.txt")));
        assert!(!is_supported_audio_file(Path::new("music/mp3")));
    }

    #[test]
    fn test_walk_is_recursive_filtered_and_sorted() {
        let dir = unique_temp_dir("discovery");
        fs::create_dir_all(dir.join("inner")).expect("nested dir should be creatable");
        fs::write(dir.join("b.mp3"), b"x").expect("fixture should be writable");
        fs::write(dir.join("a.flac"), b"x").expect("fixture should be writable");
        fs::write(dir.join("notes.txt"), b"x").expect("fixture should be writable");
        fs::write(dir.join("inner").join("c.wav"), b"x").expect("fixture should be writable");

        let files = collect_audio_files_from_folder(&dir);
        assert_eq!(
            files,
            vec![
                dir.join("a.flac"),
                dir.join("b.mp3"),
                dir.join("inner").join("c.wav"),
            ]
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_folder_yields_nothing() {
        let dir = std::env::temp_dir().join("tagsmith_discovery_missing_nonexistent");
        assert!(collect_audio_files_from_folder(&dir).is_empty());
    }
}
