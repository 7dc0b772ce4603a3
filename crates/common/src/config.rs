//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where finished videos are written (user-visible).
    pub output_dir: PathBuf,

    /// Directory holding background clips to loop behind the subtitles.
    pub backgrounds_dir: PathBuf,

    /// Asset cache settings.
    pub cache: CacheConfig,

    /// Remote content fetch settings.
    pub fetch: FetchConfig,

    /// Default composition parameters.
    pub composition: CompositionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Asset cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Application-private directory for cached audio/text/background assets.
    pub dir: PathBuf,

    /// Storage budget in bytes; least-recently-used entries are evicted
    /// once usage exceeds this.
    pub max_bytes: u64,
}

/// Remote content fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the verse/audio provider.
    pub base_url: String,

    /// Maximum in-flight fetches within one job.
    pub max_concurrent: usize,

    /// Bounded retry attempts for transport failures.
    pub max_attempts: u32,

    /// Base delay for exponential retry backoff.
    pub retry_base_delay_ms: u64,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

/// Default composition parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionDefaults {
    /// Output width in pixels (portrait).
    pub width: u32,

    /// Output height in pixels (portrait).
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// x264 encoding preset.
    pub preset: String,

    /// x264 CRF value (lower = better quality).
    pub crf: u32,

    /// AAC audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Minimum on-screen duration for one subtitle segment.
    pub min_segment_ms: u64,

    /// Words per estimated subtitle unit (0 = whole verse as one unit).
    pub words_per_segment: usize,

    /// Target narration length for random selections, in seconds.
    pub target_duration_secs: u64,

    /// Hard cap on narration length, in seconds.
    pub max_duration_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "versecast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs_default_output(),
            backgrounds_dir: dirs_default_data().join("backgrounds"),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            composition: CompositionDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: dirs_default_data().join("cache"),
            max_bytes: 512 * 1024 * 1024,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.alquran.cloud/v1".to_string(),
            max_concurrent: 6,
            max_attempts: 3,
            retry_base_delay_ms: 250,
            timeout_secs: 30,
        }
    }
}

impl Default for CompositionDefaults {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            preset: "medium".to_string(),
            crf: 28,
            audio_bitrate_kbps: 96,
            min_segment_ms: 500,
            words_per_segment: 8,
            target_duration_secs: 90,
            max_duration_secs: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("versecast").join("config.json")
}

/// Application-private data directory.
fn dirs_default_data() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("versecast")
}

/// Default user-visible output directory.
fn dirs_default_output() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join("Videos").join("versecast")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_portrait() {
        let config = AppConfig::default();
        assert_eq!(config.composition.width, 1080);
        assert_eq!(config.composition.height, 1920);
        assert!(config.composition.height > config.composition.width);
    }

    #[test]
    fn fetch_concurrency_is_bounded() {
        let config = FetchConfig::default();
        assert!(config.max_concurrent >= 4 && config.max_concurrent <= 8);
        assert!(config.max_attempts >= 1);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.cache.max_bytes, config.cache.max_bytes);
        assert_eq!(parsed.fetch.base_url, config.fetch.base_url);
    }
}
