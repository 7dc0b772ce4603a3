//! SRT sidecar generation.

use versecast_common::error::VersecastResult;

use crate::track::OverlayTrack;

/// Generate SRT content from an overlay track.
///
/// SRT has no styling, so Arabic and translation events are emitted in
/// plain time order.
pub fn generate_srt(track: &OverlayTrack) -> String {
    let mut output = String::new();

    for (i, event) in track.events().iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(event.start_ms),
            format_srt_time(event.end_ms),
        ));
        output.push_str(&event.text);
        output.push_str("\n\n");
    }

    output
}

/// Save an SRT sidecar next to the output video.
pub fn save_srt(track: &OverlayTrack, path: &std::path::Path) -> VersecastResult<()> {
    std::fs::write(path, generate_srt(track))?;
    Ok(())
}

/// Format milliseconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(ms: u64) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let seconds = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
