//! Content-addressed upload storage.
//!
//! Files are named by the SHA-256 digest of their bytes, so identical
//! uploads resolve to the identical on-disk path and are written at most
//! once. The store is write-once: an existing file is never overwritten,
//! only reused.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Result of storing (or re-storing) an upload.
#[derive(Debug, Clone)]
pub struct StoredAudio {
    /// Full SHA-256 hex digest of the file bytes.
    pub hash: String,
    /// Derived filename: `<hash>.<ext>`.
    pub filename: String,
    /// Path string persisted in the database and returned to clients,
    /// forward-slashed (e.g. `data/uploads/<hash>.mp3`).
    pub filepath: String,
    /// Size of the payload in bytes.
    pub size: u64,
    /// True when a file with this content already existed and no write
    /// was performed.
    pub deduplicated: bool,
}

/// Filesystem store for uploaded audio, keyed by content hash.
pub struct UploadStore {
    upload_dir: PathBuf,
}

impl UploadStore {
    /// Create a new `UploadStore` rooted at the given directory.
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    /// Store a payload under its content hash, preserving `extension`.
    ///
    /// Creates the uploads directory if needed, then writes the file only
    /// if no file at `<dir>/<hash>.<ext>` exists yet. Two concurrent
    /// uploads of identical bytes may both pass the existence check and
    /// write; that race is benign because both produce byte-identical
    /// content at the same path.
    pub fn store(&self, data: &[u8], extension: &str) -> quaver_core::Result<StoredAudio> {
        let hash = hex::encode(Sha256::digest(data));
        let ext = extension.trim_start_matches('.').to_lowercase();
        let filename = format!("{hash}.{ext}");

        std::fs::create_dir_all(&self.upload_dir)?;

        let path = self.upload_dir.join(&filename);
        let deduplicated = path.exists();
        if !deduplicated {
            std::fs::write(&path, data)?;
        }

        Ok(StoredAudio {
            hash,
            filename,
            filepath: path_string(&path),
            size: data.len() as u64,
            deduplicated,
        })
    }

    /// The directory uploads are written to.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}

/// Normalize a path for persistence: forward slashes, no leading `./`.
fn path_string(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    s.strip_prefix("./").map(|p| p.to_string()).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_under_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let stored = store.store(b"some audio bytes", "mp3").unwrap();
        assert_eq!(stored.hash.len(), 64);
        assert_eq!(stored.filename, format!("{}.mp3", stored.hash));
        assert_eq!(stored.size, 16);
        assert!(!stored.deduplicated);
        assert!(dir.path().join(&stored.filename).exists());
    }

    #[test]
    fn identical_bytes_deduplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let first = store.store(b"identical payload", "mp3").unwrap();
        let second = store.store(b"identical payload", "mp3").unwrap();

        assert_eq!(first.filepath, second.filepath);
        assert!(!first.deduplicated);
        assert!(second.deduplicated);

        // Only one file on disk.
        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn different_bytes_store_separately() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let a = store.store(b"track one", "mp3").unwrap();
        let b = store.store(b"track two", "mp3").unwrap();
        assert_ne!(a.hash, b.hash);

        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn same_bytes_different_extension_store_separately() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let a = store.store(b"same bytes", "mp3").unwrap();
        let b = store.store(b"same bytes", "ogg").unwrap();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.filename, b.filename);
    }

    #[test]
    fn existing_file_is_never_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let stored = store.store(b"write once", "wav").unwrap();
        let path = dir.path().join(&stored.filename);
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();

        store.store(b"write once", "wav").unwrap();
        let mtime_after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime, mtime_after);
    }

    #[test]
    fn extension_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let stored = store.store(b"dotted", ".MP3").unwrap();
        assert!(stored.filename.ends_with(".mp3"));
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = UploadStore::new(nested.clone());

        let stored = store.store(b"nested", "ogg").unwrap();
        assert!(nested.join(&stored.filename).exists());
    }

    #[test]
    fn unwritable_directory_propagates_io_error() {
        // A file where the directory should be makes create_dir_all fail.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = UploadStore::new(blocker);
        let err = store.store(b"payload", "mp3").unwrap_err();
        assert!(matches!(err, quaver_core::Error::Io { .. }));
    }

    #[test]
    fn filepath_uses_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());
        let stored = store.store(b"slashes", "m4a").unwrap();
        assert!(!stored.filepath.contains('\\'));
        assert!(stored.filepath.ends_with(&stored.filename));
    }
}
