//! The remote content provider boundary.
//!
//! The provider is a read-only verse/audio service queried by
//! (surah, ayah, reciter edition, translation edition). It is treated as
//! potentially slow or unavailable; every transport failure maps to
//! [`VersecastError::Network`] so the client's retry policy can act on it.

use async_trait::async_trait;
use serde::Deserialize;
use versecast_common::config::FetchConfig;
use versecast_common::error::{VersecastError, VersecastResult};
use versecast_verse_model::{Language, Reciter, TimingSpan, VerseRef};

/// A provider's answer for one verse.
#[derive(Debug, Clone)]
pub struct ProviderVerse {
    pub arabic_text: String,
    pub translation: Option<String>,
    pub audio_url: String,
    pub timing: Option<Vec<TimingSpan>>,
}

/// Read-only verse/audio provider.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch one verse's text, optional translation, and audio locator.
    async fn fetch_verse(
        &self,
        verse: VerseRef,
        reciter: Reciter,
        translation: Option<Language>,
    ) -> VersecastResult<ProviderVerse>;

    /// Fetch narration audio bytes.
    async fn fetch_audio(&self, url: &str) -> VersecastResult<Vec<u8>>;
}

/// HTTP implementation against an alquran.cloud-style API.
pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentSource {
    pub fn new(config: &FetchConfig) -> VersecastResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VersecastError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: u32,
    data: Vec<ApiEdition>,
}

#[derive(Debug, Deserialize)]
struct ApiEdition {
    text: String,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    timing: Option<Vec<TimingSpan>>,
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_verse(
        &self,
        verse: VerseRef,
        reciter: Reciter,
        translation: Option<Language>,
    ) -> VersecastResult<ProviderVerse> {
        let editions = match translation {
            Some(language) => format!("{},{}", reciter.id(), language.edition()),
            None => reciter.id().to_string(),
        };
        let url = format!(
            "{}/ayah/{}:{}/editions/{}",
            self.base_url, verse.surah, verse.ayah, editions
        );

        tracing::debug!(%url, "Fetching verse");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VersecastError::network(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(VersecastError::not_found(format!(
                "provider has no data for verse {verse}"
            )));
        }
        if !status.is_success() {
            return Err(VersecastError::network(format!(
                "provider returned HTTP {status} for {url}"
            )));
        }

        let api: ApiResponse = response
            .json()
            .await
            .map_err(|e| VersecastError::network(format!("Malformed provider response: {e}")))?;

        if api.code != 200 {
            return Err(VersecastError::not_found(format!(
                "provider rejected verse {verse} (code {})",
                api.code
            )));
        }

        let mut editions = api.data.into_iter();
        let arabic = editions.next().ok_or_else(|| {
            VersecastError::network(format!("provider returned no editions for {verse}"))
        })?;

        let audio_url = arabic.audio.filter(|u| !u.is_empty()).ok_or_else(|| {
            VersecastError::not_found(format!(
                "no audio available for verse {verse} with reciter {}",
                reciter.id()
            ))
        })?;

        let translation_text = translation.and_then(|_| editions.next()).map(|e| e.text);

        Ok(ProviderVerse {
            arabic_text: arabic.text,
            translation: translation_text,
            audio_url,
            timing: arabic.timing,
        })
    }

    async fn fetch_audio(&self, url: &str) -> VersecastResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VersecastError::network(format!("Audio request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VersecastError::network(format!(
                "audio fetch returned HTTP {status} for {url}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VersecastError::network(format!("Audio download from {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}
