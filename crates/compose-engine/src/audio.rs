//! Narration track assembly.
//!
//! Per-verse audio files are concatenated stream-copy (no re-encode) with
//! ffmpeg's concat demuxer; per-verse start offsets come from the probed
//! durations so subtitle shifting stays deterministic.

use std::path::{Path, PathBuf};
use std::process::Command;

use versecast_common::error::{VersecastError, VersecastResult};
use versecast_verse_model::VerseRecord;

/// The concatenated narration and its verse layout.
#[derive(Debug, Clone)]
pub struct NarrationTrack {
    /// Concatenated audio file.
    pub path: PathBuf,

    /// Total duration in milliseconds.
    pub total_ms: u64,

    /// Start offset of each verse on the narration timeline, in input order.
    pub verse_offsets_ms: Vec<u64>,
}

/// Cumulative start offsets and total duration for a duration sequence.
pub fn compute_offsets(durations_ms: &[u64]) -> (Vec<u64>, u64) {
    let mut offsets = Vec::with_capacity(durations_ms.len());
    let mut acc = 0u64;
    for duration in durations_ms {
        offsets.push(acc);
        acc += duration;
    }
    (offsets, acc)
}

/// Concatenate per-verse audio into one narration track inside `work_dir`.
pub fn concat_narration(records: &[VerseRecord], work_dir: &Path) -> VersecastResult<NarrationTrack> {
    let list_path = work_dir.join("narration-concat.txt");
    std::fs::write(&list_path, build_concat_list(records))?;

    let output_path = work_dir.join("narration.mp3");
    let output = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(&output_path)
        .output()
        .map_err(|e| VersecastError::composition(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(VersecastError::composition(format!(
            "audio concat failed (status {}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let durations: Vec<u64> = records.iter().map(|r| r.duration_ms).collect();
    let (verse_offsets_ms, total_ms) = compute_offsets(&durations);

    tracing::info!(
        verses = records.len(),
        total_ms,
        "Narration track assembled"
    );
    Ok(NarrationTrack {
        path: output_path,
        total_ms,
        verse_offsets_ms,
    })
}

/// Concat demuxer input list; one `file` directive per verse.
fn build_concat_list(records: &[VerseRecord]) -> String {
    let mut list = String::new();
    for record in records {
        list.push_str(&format!("file '{}'\n", escape_concat_path(&record.audio_path)));
    }
    list
}

/// The concat demuxer reads single-quoted paths; quotes inside the path
/// close and reopen the literal.
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use versecast_verse_model::VerseRef;

    fn record(ayah: u16, duration_ms: u64, audio: &str) -> VerseRecord {
        VerseRecord {
            verse: VerseRef { surah: 1, ayah },
            arabic_text: "نص".to_string(),
            translation: None,
            translation_language: None,
            audio_key: format!("audio/ar.alafasy/1/{ayah}"),
            audio_path: PathBuf::from(audio),
            duration_ms,
            timing: None,
        }
    }

    #[test]
    fn offsets_are_cumulative() {
        let (offsets, total) = compute_offsets(&[4000, 2500, 3000]);
        assert_eq!(offsets, vec![0, 4000, 6500]);
        assert_eq!(total, 9500);
    }

    #[test]
    fn empty_sequence_has_no_offsets() {
        let (offsets, total) = compute_offsets(&[]);
        assert!(offsets.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn concat_list_preserves_order() {
        let records = vec![
            record(1, 4000, "/tmp/a.mp3"),
            record(2, 2500, "/tmp/b.mp3"),
        ];
        let list = build_concat_list(&records);
        assert_eq!(list, "file '/tmp/a.mp3'\nfile '/tmp/b.mp3'\n");
    }

    #[test]
    fn quoted_paths_are_escaped() {
        assert_eq!(
            escape_concat_path(Path::new("/tmp/it's here.mp3")),
            "/tmp/it'\\''s here.mp3"
        );
    }
}
