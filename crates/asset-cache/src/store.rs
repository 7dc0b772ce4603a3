//! The asset cache: checksummed entries, LRU eviction, job pinning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use versecast_common::error::{VersecastError, VersecastResult};

use crate::backend::{CacheBackend, FsBackend, MemoryBackend};
use crate::key::CacheKey;

/// Name of the persisted index. Never collides with entry names, which are
/// 64-character hex digests.
const INDEX_NAME: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    size_bytes: u64,
    checksum: String,
    last_used: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheIndex {
    entries: HashMap<String, EntryMeta>,
    tick: u64,
}

struct CacheState {
    index: CacheIndex,
    pinned: HashMap<String, usize>,
}

/// Content-addressed asset store with a byte budget.
///
/// Entries are immutable once written; a re-put of the same key overwrites
/// atomically, so concurrent writers of the same asset never corrupt each
/// other.
pub struct AssetCache {
    backend: Box<dyn CacheBackend>,
    budget_bytes: u64,
    state: Mutex<CacheState>,
}

impl AssetCache {
    /// Open a filesystem-backed cache, reconciling the persisted index
    /// against the entries actually on disk.
    pub fn open_fs(dir: impl AsRef<Path>, budget_bytes: u64) -> VersecastResult<Self> {
        let backend = FsBackend::new(dir.as_ref())?;
        Self::open(Box::new(backend), budget_bytes)
    }

    /// Purely in-memory cache, for tests.
    pub fn in_memory(budget_bytes: u64) -> Self {
        Self::open(Box::new(MemoryBackend::new()), budget_bytes)
            .expect("in-memory cache cannot fail to open")
    }

    /// Open a cache over an arbitrary backend.
    pub fn open(backend: Box<dyn CacheBackend>, budget_bytes: u64) -> VersecastResult<Self> {
        let mut index: CacheIndex = match backend.read(INDEX_NAME)? {
            Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Cache index unreadable, rebuilding: {e}");
                CacheIndex::default()
            }),
            None => CacheIndex::default(),
        };

        // Reconcile: drop index entries with no backing bytes, adopt
        // orphaned entries (e.g. after index loss) with a cold timestamp.
        let on_disk = backend.list()?;
        index.entries.retain(|name, _| on_disk.contains(name));
        for name in on_disk {
            if name == INDEX_NAME || index.entries.contains_key(&name) {
                continue;
            }
            if let Some(bytes) = backend.read(&name)? {
                index.entries.insert(
                    name,
                    EntryMeta {
                        size_bytes: bytes.len() as u64,
                        checksum: checksum_of(&bytes),
                        last_used: 0,
                    },
                );
            }
        }
        index.tick = index
            .entries
            .values()
            .map(|m| m.last_used + 1)
            .max()
            .unwrap_or(0)
            .max(index.tick);

        Ok(Self {
            backend,
            budget_bytes,
            state: Mutex::new(CacheState {
                index,
                pinned: HashMap::new(),
            }),
        })
    }

    /// Look up an entry, verifying its checksum.
    ///
    /// A checksum mismatch drops the entry and returns
    /// [`VersecastError::CacheCorruption`] so the caller can re-fetch.
    pub fn get(&self, key: &CacheKey) -> VersecastResult<Option<Vec<u8>>> {
        let name = key.storage_name();
        let mut state = self.state.lock().unwrap();

        let Some(meta) = state.index.entries.get(&name).cloned() else {
            return Ok(None);
        };

        let Some(bytes) = self.backend.read(&name)? else {
            state.index.entries.remove(&name);
            self.persist_index(&state);
            return Ok(None);
        };

        if checksum_of(&bytes) != meta.checksum {
            tracing::warn!(key = %key, "Cache checksum mismatch, dropping entry");
            self.backend.remove(&name)?;
            state.index.entries.remove(&name);
            self.persist_index(&state);
            return Err(VersecastError::cache_corruption(key.as_str()));
        }

        let tick = state.index.tick;
        state.index.tick += 1;
        if let Some(meta) = state.index.entries.get_mut(&name) {
            meta.last_used = tick;
        }
        self.persist_index(&state);
        Ok(Some(bytes))
    }

    /// Store an entry, evicting least-recently-used unpinned entries if the
    /// budget would be exceeded. Key collisions overwrite.
    pub fn put(&self, key: &CacheKey, bytes: &[u8]) -> VersecastResult<()> {
        let name = key.storage_name();
        self.backend.write(&name, bytes)?;

        let mut state = self.state.lock().unwrap();
        let tick = state.index.tick;
        state.index.tick += 1;
        state.index.entries.insert(
            name,
            EntryMeta {
                size_bytes: bytes.len() as u64,
                checksum: checksum_of(bytes),
                last_used: tick,
            },
        );
        self.evict_to_budget(&mut state)?;
        self.persist_index(&state);
        Ok(())
    }

    /// Whether an entry exists (without touching its LRU position).
    pub fn contains(&self, key: &CacheKey) -> bool {
        let state = self.state.lock().unwrap();
        state.index.entries.contains_key(&key.storage_name())
    }

    /// Materialize an entry as a local file for external tools (ffmpeg).
    ///
    /// Filesystem-backed entries are returned in place; other backends are
    /// spilled into `fallback_dir`. Content is checksum-verified either way.
    pub fn materialize(
        &self,
        key: &CacheKey,
        fallback_dir: &Path,
        extension: &str,
    ) -> VersecastResult<Option<PathBuf>> {
        let Some(bytes) = self.get(key)? else {
            return Ok(None);
        };

        let name = key.storage_name();
        if let Some(path) = self.backend.entry_path(&name) {
            return Ok(Some(path));
        }

        std::fs::create_dir_all(fallback_dir)?;
        let path = fallback_dir.join(format!("{name}.{extension}"));
        std::fs::write(&path, &bytes)?;
        Ok(Some(path))
    }

    /// Pin entries for the lifetime of the returned guard; pinned entries
    /// are never evicted.
    pub fn pin(self: &Arc<Self>, keys: &[CacheKey]) -> PinGuard {
        let names: Vec<String> = keys.iter().map(|k| k.storage_name()).collect();
        {
            let mut state = self.state.lock().unwrap();
            for name in &names {
                *state.pinned.entry(name.clone()).or_insert(0) += 1;
            }
        }
        PinGuard {
            cache: Arc::clone(self),
            names,
        }
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.state.lock().unwrap().index.entries.len()
    }

    /// Total bytes currently stored.
    pub fn usage_bytes(&self) -> u64 {
        let state = self.state.lock().unwrap();
        state.index.entries.values().map(|m| m.size_bytes).sum()
    }

    /// Remove all unpinned entries.
    pub fn clear(&self) -> VersecastResult<()> {
        let mut state = self.state.lock().unwrap();
        let names: Vec<String> = state
            .index
            .entries
            .keys()
            .filter(|name| !is_pinned(&state.pinned, name))
            .cloned()
            .collect();
        for name in names {
            self.backend.remove(&name)?;
            state.index.entries.remove(&name);
        }
        self.persist_index(&state);
        Ok(())
    }

    fn evict_to_budget(&self, state: &mut CacheState) -> VersecastResult<()> {
        loop {
            let usage: u64 = state.index.entries.values().map(|m| m.size_bytes).sum();
            if usage <= self.budget_bytes {
                return Ok(());
            }

            let victim = state
                .index
                .entries
                .iter()
                .filter(|(name, _)| !is_pinned(&state.pinned, name))
                .min_by_key(|(_, meta)| meta.last_used)
                .map(|(name, _)| name.clone());

            let Some(name) = victim else {
                tracing::warn!(
                    usage_bytes = usage,
                    budget_bytes = self.budget_bytes,
                    "Cache over budget but all entries pinned"
                );
                return Ok(());
            };

            tracing::debug!(entry = %name, "Evicting LRU cache entry");
            self.backend.remove(&name)?;
            state.index.entries.remove(&name);
        }
    }

    fn persist_index(&self, state: &CacheState) {
        match serde_json::to_vec(&state.index) {
            Ok(bytes) => {
                if let Err(e) = self.backend.write(INDEX_NAME, &bytes) {
                    tracing::warn!("Failed to persist cache index: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize cache index: {e}"),
        }
    }

    fn unpin(&self, names: &[String]) {
        let mut state = self.state.lock().unwrap();
        for name in names {
            if let Some(count) = state.pinned.get_mut(name) {
                *count -= 1;
                if *count == 0 {
                    state.pinned.remove(name);
                }
            }
        }
    }
}

fn is_pinned(pinned: &HashMap<String, usize>, name: &str) -> bool {
    pinned.get(name).copied().unwrap_or(0) > 0
}

fn checksum_of(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Keeps a set of cache entries pinned until dropped.
pub struct PinGuard {
    cache: Arc<AssetCache>,
    names: Vec<String>,
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.cache.unpin(&self.names);
    }
}
