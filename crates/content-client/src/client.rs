//! Cache-first verse resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use versecast_asset_cache::{AssetCache, CacheKey};
use versecast_common::config::FetchConfig;
use versecast_common::error::{VersecastError, VersecastResult};
use versecast_verse_model::{Language, Reciter, TimingSpan, VerseRecord, VerseRef};

use crate::probe::DurationProbe;
use crate::source::ContentSource;

/// Shape of the cached text record. The probed audio duration is persisted
/// here so cache hits never re-probe.
#[derive(Debug, Serialize, Deserialize)]
struct CachedVerse {
    arabic_text: String,
    translation: Option<String>,
    translation_language: Option<Language>,
    duration_ms: u64,
    timing: Option<Vec<TimingSpan>>,
}

/// Resolves verse references to complete records, consulting the asset
/// cache before the remote provider.
#[derive(Clone)]
pub struct ContentClient {
    source: Arc<dyn ContentSource>,
    cache: Arc<AssetCache>,
    probe: Arc<dyn DurationProbe>,
    config: FetchConfig,
}

impl ContentClient {
    pub fn new(
        source: Arc<dyn ContentSource>,
        cache: Arc<AssetCache>,
        probe: Arc<dyn DurationProbe>,
        config: FetchConfig,
    ) -> Self {
        Self {
            source,
            cache,
            probe,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.cache
    }

    /// Resolve a verse sequence to records, in input order.
    ///
    /// Every reference is validated before any network traffic. Fetches run
    /// concurrently under a bounded semaphore; the first failure aborts the
    /// remaining work and is surfaced as the job's error.
    pub async fn resolve(
        &self,
        verses: &[VerseRef],
        reciter: Reciter,
        translation: Option<Language>,
        scratch_dir: &Path,
    ) -> VersecastResult<Vec<VerseRecord>> {
        for verse in verses {
            verse.validate()?;
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.clamp(1, 8)));
        let mut tasks = JoinSet::new();
        for (index, verse) in verses.iter().copied().enumerate() {
            let client = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let scratch = scratch_dir.to_path_buf();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                let result = client
                    .resolve_one(verse, reciter, translation, scratch)
                    .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<VerseRecord>> = verses.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(record))) => slots[index] = Some(record),
                Ok((_, Err(e))) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(anyhow::anyhow!("fetch task failed: {e}").into());
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| anyhow::anyhow!("fetch slot left unfilled").into()))
            .collect()
    }

    async fn resolve_one(
        &self,
        verse: VerseRef,
        reciter: Reciter,
        translation: Option<Language>,
        scratch: PathBuf,
    ) -> VersecastResult<VerseRecord> {
        let text_key = CacheKey::text(verse, reciter, translation);
        let audio_key = CacheKey::audio(verse, reciter);

        match self.load_cached(verse, translation, &text_key, &audio_key, &scratch) {
            Ok(Some(record)) => {
                tracing::debug!(%verse, "Cache hit");
                return Ok(record);
            }
            Ok(None) => {}
            Err(VersecastError::CacheCorruption { key }) => {
                tracing::warn!(%verse, %key, "Cache corruption, re-fetching");
            }
            Err(e) => return Err(e),
        }

        self.fetch_and_store(verse, reciter, translation, &text_key, &audio_key, &scratch)
            .await
    }

    fn load_cached(
        &self,
        verse: VerseRef,
        translation: Option<Language>,
        text_key: &CacheKey,
        audio_key: &CacheKey,
        scratch: &Path,
    ) -> VersecastResult<Option<VerseRecord>> {
        let Some(bytes) = self.cache.get(text_key)? else {
            return Ok(None);
        };

        // The checksum already passed; an unparsable record means we stored
        // garbage, which the corruption path repairs by re-fetching.
        let cached: CachedVerse = serde_json::from_slice(&bytes)
            .map_err(|_| VersecastError::cache_corruption(text_key.as_str()))?;

        if cached.translation_language != translation {
            return Ok(None);
        }

        let Some(audio_path) = self.cache.materialize(audio_key, scratch, "mp3")? else {
            return Ok(None);
        };

        Ok(Some(VerseRecord {
            verse,
            arabic_text: cached.arabic_text,
            translation: cached.translation,
            translation_language: cached.translation_language,
            audio_key: audio_key.as_str().to_string(),
            audio_path,
            duration_ms: cached.duration_ms,
            timing: cached.timing,
        }))
    }

    async fn fetch_and_store(
        &self,
        verse: VerseRef,
        reciter: Reciter,
        translation: Option<Language>,
        text_key: &CacheKey,
        audio_key: &CacheKey,
        scratch: &Path,
    ) -> VersecastResult<VerseRecord> {
        let provider = self
            .with_retry(|| {
                let source = Arc::clone(&self.source);
                async move { source.fetch_verse(verse, reciter, translation).await }
            })
            .await?;

        // A text-record miss does not force an audio re-download; the audio
        // entry is shared across translation languages.
        let audio_cached = match self.cache.get(audio_key) {
            Ok(bytes) => bytes,
            Err(VersecastError::CacheCorruption { .. }) => None,
            Err(e) => return Err(e),
        };
        if audio_cached.is_none() {
            let audio_url = provider.audio_url.clone();
            let audio = self
                .with_retry(|| {
                    let source = Arc::clone(&self.source);
                    let url = audio_url.clone();
                    async move { source.fetch_audio(&url).await }
                })
                .await?;
            self.cache.put(audio_key, &audio)?;
        }
        let audio_path = self
            .cache
            .materialize(audio_key, scratch, "mp3")?
            .ok_or_else(|| {
                VersecastError::config("cache budget too small to hold this job's audio")
            })?;

        let duration_ms = self.probe.duration_ms(&audio_path)?;

        let cached = CachedVerse {
            arabic_text: provider.arabic_text.clone(),
            translation: provider.translation.clone(),
            translation_language: translation,
            duration_ms,
            timing: provider.timing.clone(),
        };
        self.cache.put(text_key, &serde_json::to_vec(&cached)?)?;

        tracing::info!(%verse, duration_ms, "Fetched and cached verse");
        Ok(VerseRecord {
            verse,
            arabic_text: provider.arabic_text,
            translation: provider.translation,
            translation_language: translation,
            audio_key: audio_key.as_str().to_string(),
            audio_path,
            duration_ms,
            timing: provider.timing,
        })
    }

    /// Retry transport failures with bounded exponential backoff; anything
    /// else is surfaced immediately.
    async fn with_retry<T, F, Fut>(&self, operation: F) -> VersecastResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = VersecastResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts.max(1) => {
                    let delay_ms = self.config.retry_base_delay_ms << (attempt - 1);
                    tracing::warn!(error = %e, attempt, delay_ms, "Fetch failed, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
