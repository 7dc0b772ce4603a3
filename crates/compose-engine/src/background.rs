//! Background clip selection.
//!
//! Picks a clip from the backgrounds directory (random, or filtered by a
//! theme substring) and falls back to a synthesized solid-color background
//! when nothing is available.

use std::path::{Path, PathBuf};

use rand::Rng;

/// Clip container formats considered for backgrounds.
pub const BACKGROUND_EXTENSIONS: [&str; 4] = ["mp4", "mov", "mkv", "avi"];

/// Fallback background color.
pub const FALLBACK_COLOR: &str = "#0F5132";

/// The visual source behind the subtitles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// A clip, looped and trimmed to the narration duration.
    Clip(PathBuf),

    /// A synthesized solid-color frame.
    Solid { color: String },
}

/// Choose a background for the job.
pub fn select_background<R: Rng + ?Sized>(
    dir: &Path,
    theme: Option<&str>,
    rng: &mut R,
) -> Background {
    let mut clips = list_clips(dir);

    if let Some(theme) = theme {
        let needle = theme.to_lowercase();
        clips.retain(|clip| {
            clip.file_stem()
                .map(|stem| stem.to_string_lossy().to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
    }

    if clips.is_empty() {
        tracing::info!(dir = %dir.display(), "No background clips found, using solid color");
        return Background::Solid {
            color: FALLBACK_COLOR.to_string(),
        };
    }

    let selected = clips[rng.gen_range(0..clips.len())].clone();
    tracing::info!(clip = %selected.display(), "Selected background clip");
    Background::Clip(selected)
}

/// All candidate clips in the directory, sorted for deterministic choice
/// under a seeded RNG.
pub fn list_clips(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut clips: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    BACKGROUND_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
        })
        .collect();
    clips.sort();
    clips
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn missing_directory_falls_back_to_solid() {
        let mut rng = StdRng::seed_from_u64(1);
        let background = select_background(Path::new("/nonexistent"), None, &mut rng);
        assert_eq!(
            background,
            Background::Solid {
                color: FALLBACK_COLOR.to_string()
            }
        );
    }

    #[test]
    fn only_video_extensions_are_considered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ocean.mp4");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "clouds.MOV");

        let clips = list_clips(dir.path());
        assert_eq!(clips.len(), 2);
    }

    #[test]
    fn theme_filters_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ocean-waves.mp4");
        touch(dir.path(), "desert-dunes.mp4");

        let mut rng = StdRng::seed_from_u64(1);
        let background = select_background(dir.path(), Some("ocean"), &mut rng);
        assert_eq!(
            background,
            Background::Clip(dir.path().join("ocean-waves.mp4"))
        );
    }

    #[test]
    fn unmatched_theme_falls_back_to_solid() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ocean-waves.mp4");

        let mut rng = StdRng::seed_from_u64(1);
        let background = select_background(dir.path(), Some("forest"), &mut rng);
        assert!(matches!(background, Background::Solid { .. }));
    }

    #[test]
    fn selection_is_deterministic_under_a_seed() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            touch(dir.path(), &format!("clip-{i}.mp4"));
        }

        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        assert_eq!(
            select_background(dir.path(), None, &mut a),
            select_background(dir.path(), None, &mut b)
        );
    }
}
