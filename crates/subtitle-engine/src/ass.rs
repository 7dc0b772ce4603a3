//! ASS subtitle generation for burn-in.
//!
//! Two styles: Arabic centered mid-frame, translation in the lower third,
//! both white with a dark outline so they stay readable on any background.

use crate::layout::LayoutOptions;
use crate::track::{LayoutHint, OverlayTrack};

/// Render the overlay track as an ASS document sized to the output frame.
pub fn render_ass(track: &OverlayTrack, layout: &LayoutOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "[Script Info]\n\
         Title: Versecast Subtitles\n\
         ScriptType: v4.00+\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         WrapStyle: 2\n\
         ScaledBorderAndShadow: yes\n\
         YCbCr Matrix: None\n\
         \n",
        width = layout.frame_width_px,
        height = layout.frame_height_px,
    ));

    output.push_str(
        "[V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    output.push_str(&format!(
        "Style: Arabic,Arial,{arabic_px},&H00FFFFFF,&H000000FF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,3,2,5,{margin},{margin},450,1\n",
        arabic_px = layout.arabic_font_px,
        margin = layout.horizontal_margin_px,
    ));
    output.push_str(&format!(
        "Style: Translation,Arial,{translation_px},&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,{margin},{margin},120,1\n",
        translation_px = layout.translation_font_px,
        margin = layout.horizontal_margin_px,
    ));
    output.push('\n');

    output.push_str(
        "[Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );
    for event in track.events() {
        let style = match event.layout {
            LayoutHint::Center => "Arabic",
            LayoutHint::Bottom => "Translation",
        };
        output.push_str(&format!(
            "Dialogue: 0,{start},{end},{style},,0,0,0,,{text}\n",
            start = format_ass_time(event.start_ms),
            end = format_ass_time(event.end_ms),
            text = escape_ass_text(&event.text),
        ));
    }

    output
}

/// ASS time format: H:MM:SS.CS (centisecond precision).
fn format_ass_time(ms: u64) -> String {
    let cs = (ms / 10) % 100;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours}:{minutes:02}:{secs:02}.{cs:02}")
}

/// Neutralize characters that ASS treats as markup.
fn escape_ass_text(text: &str) -> String {
    text.replace('{', "(").replace('}', ")").replace('\n', "\\N")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GlyphAdvanceMeasurer;
    use crate::track::render;
    use versecast_alignment_core::VerseAlignment;
    use versecast_verse_model::{Language, TimedSegment, VerseRef};

    fn sample_track() -> OverlayTrack {
        let verse = VerseRef { surah: 1, ayah: 1 };
        let alignments = vec![VerseAlignment {
            verse,
            duration_ms: 4000,
            arabic: vec![TimedSegment {
                verse,
                text: "بسم الله الرحمن الرحيم".to_string(),
                start_ms: 0,
                end_ms: 4000,
            }],
            translation: vec![TimedSegment {
                verse,
                text: "In the name of God".to_string(),
                start_ms: 0,
                end_ms: 4000,
            }],
        }];
        render(
            &alignments,
            Some(Language::English),
            &LayoutOptions::default(),
            &GlyphAdvanceMeasurer,
        )
    }

    #[test]
    fn document_declares_portrait_play_resolution() {
        let ass = render_ass(&sample_track(), &LayoutOptions::default());
        assert!(ass.contains("PlayResX: 1080"));
        assert!(ass.contains("PlayResY: 1920"));
    }

    #[test]
    fn both_styles_are_emitted() {
        let ass = render_ass(&sample_track(), &LayoutOptions::default());
        assert!(ass.contains("Style: Arabic,"));
        assert!(ass.contains("Style: Translation,"));
        assert!(ass.contains(",Arabic,,0,0,0,,بسم"));
        assert!(ass.contains(",Translation,,0,0,0,,In the name of God"));
    }

    #[test]
    fn time_format_is_centisecond_ass() {
        assert_eq!(format_ass_time(0), "0:00:00.00");
        assert_eq!(format_ass_time(1500), "0:00:01.50");
        assert_eq!(format_ass_time(3_661_230), "1:01:01.23");
    }

    #[test]
    fn markup_characters_are_neutralized() {
        assert_eq!(escape_ass_text("a{\\b}c"), "a(\\b)c");
        assert_eq!(escape_ass_text("two\nlines"), "two\\Nlines");
    }
}
