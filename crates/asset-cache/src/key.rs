//! Stable cache keys for verse assets.

use std::fmt;

use sha2::{Digest, Sha256};
use versecast_verse_model::{Language, Reciter, VerseRef};

/// A stable, human-readable cache key. Hashed to a filesystem-safe name
/// when stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a verse's narration audio.
    pub fn audio(verse: VerseRef, reciter: Reciter) -> Self {
        Self(format!("audio/{}/{}/{}", reciter.id(), verse.surah, verse.ayah))
    }

    /// Key for a verse's text record (Arabic plus optional translation).
    pub fn text(verse: VerseRef, reciter: Reciter, translation: Option<Language>) -> Self {
        let lang = translation.map(|l| l.code()).unwrap_or("ar");
        Self(format!(
            "text/{}/{}/{}/{}",
            reciter.id(),
            lang,
            verse.surah,
            verse.ayah
        ))
    }

    /// Key for an arbitrary URI-addressed asset (e.g. a background clip).
    pub fn uri(uri: &str) -> Self {
        Self(format!("uri/{uri}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe storage name: SHA-256 of the key string, hex-encoded.
    pub fn storage_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
