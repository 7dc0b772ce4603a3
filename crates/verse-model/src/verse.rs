//! Verse identity and resolved verse records.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use versecast_common::error::{VersecastError, VersecastResult};

use crate::language::Language;
use crate::surah;
use crate::timing::TimingSpan;

/// Immutable identity of a single ayah.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VerseRef {
    /// Surah number, 1-114.
    pub surah: u16,

    /// Ayah number within the surah, 1-based.
    pub ayah: u16,
}

impl VerseRef {
    /// Create a verse reference, validating it against the surah catalog.
    pub fn new(surah: u16, ayah: u16) -> VersecastResult<Self> {
        let verse = Self { surah, ayah };
        verse.validate()?;
        Ok(verse)
    }

    /// Check this reference against the surah catalog.
    pub fn validate(&self) -> VersecastResult<()> {
        let count = surah::ayah_count(self.surah).ok_or_else(|| {
            VersecastError::not_found(format!("surah {} does not exist (valid: 1-114)", self.surah))
        })?;
        if self.ayah == 0 || self.ayah > count {
            return Err(VersecastError::not_found(format!(
                "ayah {}:{} does not exist (surah {} has {} ayahs)",
                self.surah, self.ayah, self.surah, count
            )));
        }
        Ok(())
    }

    /// English name of this verse's surah ("Unknown" for an unvalidated
    /// out-of-range reference).
    pub fn surah_name(&self) -> &'static str {
        surah::surah_name(self.surah).unwrap_or("Unknown")
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

impl FromStr for VerseRef {
    type Err = VersecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (surah, ayah) = s
            .split_once(':')
            .ok_or_else(|| VersecastError::config(format!("invalid verse reference '{s}', expected 'surah:ayah'")))?;
        let surah = surah
            .trim()
            .parse::<u16>()
            .map_err(|_| VersecastError::config(format!("invalid surah number in '{s}'")))?;
        let ayah = ayah
            .trim()
            .parse::<u16>()
            .map_err(|_| VersecastError::config(format!("invalid ayah number in '{s}'")))?;
        Self::new(surah, ayah)
    }
}

/// A fully resolved verse: text, translation, and locally materialized audio.
///
/// Created by the content client; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerseRecord {
    /// Verse identity.
    pub verse: VerseRef,

    /// Arabic recitation text.
    pub arabic_text: String,

    /// Translation text in `translation_language`, when requested.
    pub translation: Option<String>,

    /// Language of `translation`.
    pub translation_language: Option<Language>,

    /// Cache key under which the narration audio is stored.
    pub audio_key: String,

    /// Local path of the narration audio file.
    pub audio_path: PathBuf,

    /// Narration duration in milliseconds.
    pub duration_ms: u64,

    /// Authoritative word-level timing metadata, when the provider has it.
    pub timing: Option<Vec<TimingSpan>>,
}

impl VerseRecord {
    /// Whether this record carries authoritative timing metadata.
    pub fn has_timing(&self) -> bool {
        self.timing.as_ref().is_some_and(|spans| !spans.is_empty())
    }
}
