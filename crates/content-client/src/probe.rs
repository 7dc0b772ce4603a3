//! Media duration probing.
//!
//! Downloaded narration audio carries no trustworthy duration metadata, so
//! the client probes it once with ffprobe and persists the result in the
//! cached verse record.

use std::path::Path;
use std::process::Command;

use versecast_common::error::{VersecastError, VersecastResult};

/// Probes the duration of a local media file.
pub trait DurationProbe: Send + Sync {
    fn duration_ms(&self, path: &Path) -> VersecastResult<u64>;
}

/// ffprobe-backed probe used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeDurationProbe;

impl DurationProbe for FfprobeDurationProbe {
    fn duration_ms(&self, path: &Path) -> VersecastResult<u64> {
        media_duration_ms(path)
    }
}

/// Fixed-duration probe for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurationProbe(pub u64);

impl DurationProbe for FixedDurationProbe {
    fn duration_ms(&self, _path: &Path) -> VersecastResult<u64> {
        Ok(self.0)
    }
}

/// Probe a media file's duration with ffprobe.
pub fn media_duration_ms(path: &Path) -> VersecastResult<u64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| VersecastError::composition(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(VersecastError::composition(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let secs = raw.trim().parse::<f64>().map_err(|_| {
        VersecastError::composition(format!(
            "ffprobe returned unparsable duration '{}' for {}",
            raw.trim(),
            path.display()
        ))
    })?;
    Ok((secs * 1000.0).round() as u64)
}

/// Whether a binary is resolvable on PATH.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
