//! Composition job requests.

use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};
use versecast_common::error::{VersecastError, VersecastResult};

use crate::language::Language;
use crate::reciter::Reciter;
use crate::surah;
use crate::verse::VerseRef;

/// A request to compose one video. Created per user request, validated on
/// construction, and never persisted across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionJob {
    /// Verses in presentation order.
    pub verses: Vec<VerseRef>,

    /// Selected reciter.
    pub reciter: Reciter,

    /// At most one translation language on top of Arabic.
    pub translation: Option<Language>,

    /// Directory the finished video is written into.
    pub output_dir: PathBuf,

    /// Optional explicit output filename; generated from the verse range
    /// and a job id when absent.
    pub output_filename: Option<String>,

    /// Optional theme filter for background clip selection (filename
    /// substring); a random clip is chosen when absent.
    pub background_theme: Option<String>,
}

impl CompositionJob {
    /// Create a job, validating every verse reference up front.
    pub fn new(
        verses: Vec<VerseRef>,
        reciter: Reciter,
        translation: Option<Language>,
        output_dir: PathBuf,
    ) -> VersecastResult<Self> {
        if verses.is_empty() {
            return Err(VersecastError::config("a job needs at least one verse"));
        }
        for verse in &verses {
            verse.validate()?;
        }
        Ok(Self {
            verses,
            reciter,
            translation,
            output_dir,
            output_filename: None,
            background_theme: None,
        })
    }

    /// Build a job over a contiguous ayah range of one surah.
    pub fn from_range(
        surah: u16,
        ayah_from: u16,
        ayah_to: u16,
        reciter: Reciter,
        translation: Option<Language>,
        output_dir: PathBuf,
    ) -> VersecastResult<Self> {
        if ayah_from > ayah_to {
            return Err(VersecastError::config(format!(
                "invalid ayah range {ayah_from}-{ayah_to}"
            )));
        }
        let verses = (ayah_from..=ayah_to)
            .map(|ayah| VerseRef::new(surah, ayah))
            .collect::<VersecastResult<Vec<_>>>()?;
        Self::new(verses, reciter, translation, output_dir)
    }

    /// Pick a random surah, start ayah, and verse count sized for the
    /// target narration length (assumes roughly seven seconds per ayah).
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        reciter: Option<Reciter>,
        translation: Option<Language>,
        output_dir: PathBuf,
        target_duration_secs: u64,
    ) -> Self {
        const ESTIMATED_SECS_PER_AYAH: u64 = 7;

        let surah = rng.gen_range(1..=surah::SURAH_COUNT);
        let total_ayahs = surah::ayah_count(surah).unwrap_or(1);

        let estimated = (target_duration_secs / ESTIMATED_SECS_PER_AYAH).clamp(3, 14) as u16;
        let max_start = total_ayahs.saturating_sub(4).max(1);
        let ayah_from = rng.gen_range(1..=max_start);
        let ayah_to = (ayah_from + estimated - 1).min(total_ayahs);

        let reciter = reciter.unwrap_or_else(|| {
            let all = Reciter::all();
            all[rng.gen_range(0..all.len())]
        });

        let verses = (ayah_from..=ayah_to)
            .map(|ayah| VerseRef { surah, ayah })
            .collect();

        Self {
            verses,
            reciter,
            translation,
            output_dir,
            output_filename: None,
            background_theme: None,
        }
    }

    /// First and last verse of the request.
    pub fn verse_span(&self) -> (VerseRef, VerseRef) {
        (
            *self.verses.first().expect("job verses are non-empty"),
            *self.verses.last().expect("job verses are non-empty"),
        )
    }
}
