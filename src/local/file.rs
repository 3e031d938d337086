//! One JSON file per key

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::LocalStorage;
use crate::error::{Result, StoreError};

const FILE_EXTENSION: &str = "json";

/// Stores each document as `<dir>/<encoded key>.json`
///
/// Writes go to a uniquely named temporary sibling first and are renamed
/// into place, so a crash mid-write leaves the previous snapshot intact and
/// concurrent saves never share a temp file.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_key(key), FILE_EXTENSION))
    }

    fn failure(key: &str, source: io::Error) -> StoreError {
        StoreError::LocalStorageFailure {
            key: key.to_string(),
            source,
        }
    }
}

impl LocalStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::failure(key, e)),
        }
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::failure(key, e))?;

        // Dropping the temp file on an error path removes it
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| Self::failure(key, e))?;
        temp.write_all(json.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Self::failure(key, e))?;

        temp.persist(self.path_for(key))
            .map(|_| ())
            .map_err(|e| Self::failure(key, e.error))
    }
}

/// Maps a key onto a portable file name
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`, so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("athletes"), "athletes");
        assert_eq!(encode_key("club/athletes"), "club%2Fathletes");
        assert_eq!(encode_key("a.b"), "a%2Eb");
        assert_ne!(encode_key("a/b"), encode_key("a_b"));
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path());
        assert!(storage.load("athletes").unwrap().is_none());
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path().join("nested").join("cache"));

        storage.save("athletes", r#"[{"id":"1"}]"#).unwrap();
        storage.save("athletes", r#"[{"id":"2"}]"#).unwrap();

        assert_eq!(
            storage.load("athletes").unwrap().as_deref(),
            Some(r#"[{"id":"2"}]"#)
        );
        // No temp file is left behind
        let entries: Vec<_> = fs::read_dir(storage.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_concurrent_saves_never_tear_the_snapshot() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path());

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let storage = storage.clone();
                std::thread::spawn(move || {
                    for round in 0..100 {
                        let json = format!(r#"[{{"id":"{writer}-{round}","padding":"{}"}}]"#, "x".repeat(512));
                        storage.save("athletes", &json).unwrap();
                        let text = storage.load("athletes").unwrap().unwrap();
                        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
                        assert!(parsed.is_array());
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let entries: Vec<_> = fs::read_dir(storage.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_unwritable_dir_is_local_storage_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let storage = FileStorage::new(&blocker);
        let err = storage.save("athletes", "[]").unwrap_err();
        assert_eq!(err.kind(), "local-storage");
    }
}
