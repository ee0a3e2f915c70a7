//! File-per-key codec.
//!
//! Each key is stored as one file named after the key, holding the bincode
//! encoding of its [`Entry`]. There is no manifest: the directory listing is
//! the index.
//!
//! Writes go to a `.tmp-<key>` sibling first, are flushed to disk, and then
//! renamed over the real file, so a crash mid-write leaves the previous
//! version intact. Leftover temporary files are ignored when scanning, as
//! are files that disappear between listing the directory and reading them.
//!
//! Files must decode to exactly one entry; trailing bytes are corruption.

use crate::error::{Result, StoreError};
use crate::storage::Entry;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::{trace, warn};

/// Prefix of in-flight temporary files.
pub const TMP_PREFIX: &str = ".tmp-";

/// Fixed-width little-endian bincode that rejects trailing bytes.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Atomically writes `entry` to `dir/key`, creating `dir` if needed.
pub fn write_entry<T: Serialize>(dir: &Path, key: &str, entry: &Entry<T>) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let bytes = codec().serialize(entry).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;

    let path = dir.join(key);
    let tmp_path = dir.join(format!("{TMP_PREFIX}{key}"));

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(&tmp_path, e));
    }

    fs::rename(&tmp_path, &path).map_err(|e| StoreError::io(&path, e))?;

    trace!(key, bytes = bytes.len(), "Persisted entry");
    Ok(())
}

/// Deletes `dir/key`. Returns `false` if the file was already absent.
pub fn remove_entry(dir: &Path, key: &str) -> Result<bool> {
    let path = dir.join(key);

    match fs::remove_file(&path) {
        Ok(()) => {
            trace!(key, "Removed persisted entry");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Deletes the files of `keys`, logging failures instead of returning them.
///
/// Returns the number of files actually deleted.
pub fn remove_files_best_effort(dir: &Path, keys: &[String]) -> usize {
    let mut removed = 0;

    for key in keys {
        match remove_entry(dir, key) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!(key = %key, error = %e, "Failed to delete expired entry file"),
        }
    }

    removed
}

/// Reads and decodes every entry file in `dir`.
///
/// A missing directory yields no entries, and files removed while the scan
/// runs are skipped. Any other unreadable or undecodable file fails the
/// whole scan.
pub fn read_entries<T: DeserializeOwned>(dir: &Path) -> Result<Vec<(String, Entry<T>)>> {
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut entries = Vec::new();

    for item in listing {
        let item = item.map_err(|e| StoreError::io(dir, e))?;
        let path = item.path();
        let file_name = item.file_name();

        if file_name
            .to_str()
            .is_some_and(|name| name.starts_with(TMP_PREFIX))
        {
            trace!(file = %path.display(), "Skipping temporary file");
            continue;
        }

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(file = %path.display(), "Skipping vanished file");
                continue;
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        if !metadata.is_file() {
            continue;
        }

        let key = file_name
            .into_string()
            .map_err(|_| StoreError::InvalidFileName(path.clone()))?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(file = %path.display(), "Skipping vanished file");
                continue;
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let entry = codec()
            .deserialize(&bytes)
            .map_err(|source| StoreError::Decode {
                path: path.clone(),
                source,
            })?;

        entries.push((key, entry));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("stash");

        let entry = Entry::with_ttl("v".to_string(), Duration::from_secs(3600));
        assert_ok!(write_entry(&dir, "k", &entry));
        assert!(dir.join("k").is_file());
        assert!(!dir.join(".tmp-k").exists());

        let entries: Vec<(String, Entry<String>)> = assert_ok!(read_entries(&dir));
        assert_eq!(entries, vec![("k".to_string(), entry)]);
    }

    #[test]
    fn test_overwrite_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_ok!(write_entry(dir, "k", &Entry::with_ttl(1u32, Duration::from_secs(60))));
        assert_ok!(write_entry(dir, "k", &Entry::with_ttl(2u32, Duration::from_secs(60))));

        let entries: Vec<(String, Entry<u32>)> = assert_ok!(read_entries(dir));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.value, 2);
    }

    #[test]
    fn test_expiry_round_trips_exactly() {
        let temp_dir = TempDir::new().unwrap();
        let expires_at = SystemTime::now() - Duration::from_millis(1_234);

        assert_ok!(write_entry(temp_dir.path(), "old", &Entry::new(5i64, expires_at)));

        let entries: Vec<(String, Entry<i64>)> = assert_ok!(read_entries(temp_dir.path()));
        assert_eq!(entries[0].1.expires_at, expires_at);
        assert!(entries[0].1.is_expired());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();

        assert!(!assert_ok!(remove_entry(temp_dir.path(), "nothing")));

        assert_ok!(write_entry(temp_dir.path(), "k", &Entry::with_ttl((), Duration::from_secs(1))));
        assert!(assert_ok!(remove_entry(temp_dir.path(), "k")));
        assert!(!assert_ok!(remove_entry(temp_dir.path(), "k")));
    }

    #[test]
    fn test_missing_directory_reads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("absent");

        let entries: Vec<(String, Entry<u8>)> = assert_ok!(read_entries(&dir));
        assert!(entries.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_corrupt_file_fails_scan() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken"), [0xff, 0x01]).unwrap();

        let err = assert_err!(read_entries::<String>(temp_dir.path()));
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_skips_temporary_files_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_ok!(write_entry(dir, "k", &Entry::with_ttl(1u16, Duration::from_secs(60))));
        fs::write(dir.join(".tmp-half"), [0x00]).unwrap();
        fs::create_dir(dir.join("subdir")).unwrap();

        let entries: Vec<(String, Entry<u16>)> = assert_ok!(read_entries(dir));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "k");
    }

    #[test]
    fn test_trailing_bytes_are_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_ok!(write_entry(dir, "k", &Entry::with_ttl(9u32, Duration::from_secs(60))));
        let mut bytes = fs::read(dir.join("k")).unwrap();
        bytes.extend_from_slice(b"junk");
        fs::write(dir.join("k"), bytes).unwrap();

        let err = assert_err!(read_entries::<u32>(dir));
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_vanished_files_are_skipped() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_ok!(write_entry(dir, "k", &Entry::with_ttl(1u8, Duration::from_secs(60))));
        // Dangling links behave like files renamed or deleted mid-scan
        symlink(dir.join("vanished"), dir.join(".tmp-ghost")).unwrap();
        symlink(dir.join("also-vanished"), dir.join("ghost")).unwrap();

        let entries: Vec<(String, Entry<u8>)> = assert_ok!(read_entries(dir));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "k");
    }

    #[test]
    fn test_unwritable_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let not_a_dir = temp_dir.path().join("notadir");
        fs::write(&not_a_dir, b"plain file").unwrap();

        let err = assert_err!(write_entry(&not_a_dir, "k", &Entry::with_ttl(1u8, Duration::from_secs(1))));
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_remove_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let err = assert_err!(remove_entry(temp_dir.path(), "sub"));
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(temp_dir.path().join("sub").is_dir());
    }

    #[test]
    fn test_best_effort_removal_counts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_ok!(write_entry(dir, "a", &Entry::with_ttl(1u8, Duration::ZERO)));
        let keys = vec!["a".to_string(), "never-written".to_string()];

        assert_eq!(remove_files_best_effort(dir, &keys), 1);
        assert!(!dir.join("a").exists());
    }
}
