//! Versecast Asset Cache
//!
//! Content-addressed local store for downloaded audio, text records, and
//! background clips:
//! - Atomic writes (temp-then-rename), byte-identical reads
//! - SHA-256 checksums with corruption detection on every hit
//! - LRU eviction bounded by a storage budget
//! - Pinning so in-flight composition jobs never lose their assets

pub mod backend;
pub mod key;
pub mod store;

pub use backend::{CacheBackend, FsBackend, MemoryBackend};
pub use key::CacheKey;
pub use store::{AssetCache, PinGuard};
