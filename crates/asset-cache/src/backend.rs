//! Storage backends for the asset cache.
//!
//! The cache logic (LRU accounting, checksums, pinning) is backend-agnostic;
//! production uses the filesystem, tests can use the in-memory fake.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use versecast_common::error::VersecastResult;

/// Byte storage keyed by filesystem-safe entry names.
pub trait CacheBackend: Send + Sync {
    /// Read an entry's bytes, or `None` if absent.
    fn read(&self, name: &str) -> VersecastResult<Option<Vec<u8>>>;

    /// Write an entry atomically. Existing entries are overwritten.
    fn write(&self, name: &str, bytes: &[u8]) -> VersecastResult<()>;

    /// Remove an entry. Removing a missing entry is not an error.
    fn remove(&self, name: &str) -> VersecastResult<()>;

    /// Local path of an entry, for backends that have one.
    fn entry_path(&self, name: &str) -> Option<PathBuf>;

    /// Names of all stored entries.
    fn list(&self) -> VersecastResult<Vec<String>>;
}

/// Filesystem-backed storage. Writes go to a `.partial` sibling first and
/// are renamed into place, so readers never observe a half-written entry.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> VersecastResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl CacheBackend for FsBackend {
    fn read(&self, name: &str) -> VersecastResult<Option<Vec<u8>>> {
        match std::fs::read(self.path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> VersecastResult<()> {
        let final_path = self.path(name);
        let partial_path = self.path(&format!("{name}.partial"));

        let mut file = std::fs::File::create(&partial_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&partial_path, &final_path)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> VersecastResult<()> {
        match std::fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn entry_path(&self, name: &str) -> Option<PathBuf> {
        Some(self.path(name))
    }

    fn list(&self) -> VersecastResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            // Leftover partials from an interrupted write are not entries.
            if name.ends_with(".partial") {
                std::fs::remove_file(entry.path()).ok();
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, name: &str) -> VersecastResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> VersecastResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> VersecastResult<()> {
        self.entries.lock().unwrap().remove(name);
        Ok(())
    }

    fn entry_path(&self, _name: &str) -> Option<PathBuf> {
        None
    }

    fn list(&self) -> VersecastResult<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path()).unwrap();

        backend.write("abc", b"hello").unwrap();
        assert_eq!(backend.read("abc").unwrap().unwrap(), b"hello");
        assert_eq!(backend.read("missing").unwrap(), None);

        backend.remove("abc").unwrap();
        assert_eq!(backend.read("abc").unwrap(), None);
        backend.remove("abc").unwrap();
    }

    #[test]
    fn fs_backend_overwrites_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path()).unwrap();

        backend.write("entry", b"one").unwrap();
        backend.write("entry", b"two").unwrap();
        assert_eq!(backend.read("entry").unwrap().unwrap(), b"two");

        // No partial files remain after successful writes.
        assert!(backend.list().unwrap().iter().all(|n| !n.ends_with(".partial")));
    }

    #[test]
    fn fs_backend_list_prunes_stale_partials() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path()).unwrap();

        backend.write("kept", b"data").unwrap();
        std::fs::write(dir.path().join("orphan.partial"), b"junk").unwrap();

        let names = backend.list().unwrap();
        assert_eq!(names, vec!["kept".to_string()]);
        assert!(!dir.path().join("orphan.partial").exists());
    }

    #[test]
    fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        backend.write("x", b"1").unwrap();
        assert_eq!(backend.read("x").unwrap().unwrap(), b"1");
        assert!(backend.entry_path("x").is_none());
    }
}
