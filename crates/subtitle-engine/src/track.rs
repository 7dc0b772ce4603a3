//! Overlay track construction from aligned verses.

use std::fmt;

use serde::{Deserialize, Serialize};
use versecast_alignment_core::VerseAlignment;
use versecast_verse_model::{Language, TimedSegment};

use crate::layout::{wrap_text, LayoutOptions, TextMeasurer};

/// Language of one subtitle event. Arabic is always present; at most one
/// translation language is stacked below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageTag {
    Arabic,
    Translation(Language),
}

impl LanguageTag {
    pub fn code(&self) -> &'static str {
        match self {
            LanguageTag::Arabic => "ar",
            LanguageTag::Translation(lang) => lang.code(),
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Vertical placement of an event in the portrait frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutHint {
    /// Centered in the frame (Arabic).
    Center,
    /// Lower third (translation).
    Bottom,
}

/// One renderable text event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleEvent {
    pub start_ms: u64,
    pub end_ms: u64,

    /// Pre-wrapped text; lines separated by `\n`.
    pub text: String,

    pub language: LanguageTag,
    pub layout: LayoutHint,
}

/// All subtitle events of one composition, ordered by start time.
///
/// Guarantee: no two events of the same language overlap in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayTrack {
    events: Vec<SubtitleEvent>,
}

impl OverlayTrack {
    pub fn events(&self) -> &[SubtitleEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Events of one language, in time order.
    pub fn events_for(&self, language: LanguageTag) -> impl Iterator<Item = &SubtitleEvent> {
        self.events.iter().filter(move |e| e.language == language)
    }

    /// Append an event, clamping its start so it never overlaps the
    /// previous event of the same language. Zero-width events are dropped.
    fn push_clamped(&mut self, mut event: SubtitleEvent) {
        if let Some(previous_end) = self
            .events
            .iter()
            .rev()
            .find(|e| e.language == event.language)
            .map(|e| e.end_ms)
        {
            if event.start_ms < previous_end {
                event.start_ms = previous_end;
            }
        }
        if event.start_ms < event.end_ms {
            self.events.push(event);
        }
    }

    fn sort(&mut self) {
        self.events
            .sort_by_key(|e| (e.start_ms, e.language != LanguageTag::Arabic));
    }
}

/// Build the overlay track for a sequence of aligned verses.
///
/// Segments must already be shifted onto the narration timeline. Arabic
/// events are centered; translation events sit in the lower third.
pub fn render(
    alignments: &[VerseAlignment],
    translation: Option<Language>,
    layout: &LayoutOptions,
    measurer: &dyn TextMeasurer,
) -> OverlayTrack {
    let mut track = OverlayTrack::default();
    let usable = layout.usable_width_px();

    for alignment in alignments {
        for segment in &alignment.arabic {
            track.push_clamped(event_from_segment(
                segment,
                LanguageTag::Arabic,
                LayoutHint::Center,
                layout.arabic_font_px,
                usable,
                measurer,
            ));
        }
    }

    if let Some(language) = translation {
        for alignment in alignments {
            for segment in &alignment.translation {
                track.push_clamped(event_from_segment(
                    segment,
                    LanguageTag::Translation(language),
                    LayoutHint::Bottom,
                    layout.translation_font_px,
                    usable,
                    measurer,
                ));
            }
        }
    }

    track.sort();
    tracing::debug!(events = track.len(), "Overlay track built");
    track
}

fn event_from_segment(
    segment: &TimedSegment,
    language: LanguageTag,
    layout: LayoutHint,
    font_px: u32,
    usable_width_px: f64,
    measurer: &dyn TextMeasurer,
) -> SubtitleEvent {
    let lines = wrap_text(&segment.text, measurer, font_px, usable_width_px);
    SubtitleEvent {
        start_ms: segment.start_ms,
        end_ms: segment.end_ms,
        text: lines.join("\n"),
        language,
        layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GlyphAdvanceMeasurer;
    use versecast_verse_model::VerseRef;

    fn segment(ayah: u16, text: &str, start_ms: u64, end_ms: u64) -> TimedSegment {
        TimedSegment {
            verse: VerseRef { surah: 1, ayah },
            text: text.to_string(),
            start_ms,
            end_ms,
        }
    }

    fn alignment(
        ayah: u16,
        duration_ms: u64,
        arabic: Vec<TimedSegment>,
        translation: Vec<TimedSegment>,
    ) -> VerseAlignment {
        VerseAlignment {
            verse: VerseRef { surah: 1, ayah },
            duration_ms,
            arabic,
            translation,
        }
    }

    fn no_same_language_overlap(track: &OverlayTrack, language: LanguageTag) -> bool {
        let mut previous_end = 0u64;
        for event in track.events_for(language) {
            if event.start_ms < previous_end {
                return false;
            }
            previous_end = event.end_ms;
        }
        true
    }

    #[test]
    fn arabic_only_track_has_no_translation_events() {
        let alignments = vec![alignment(
            1,
            4000,
            vec![segment(1, "بسم الله", 0, 4000)],
            vec![],
        )];
        let track = render(
            &alignments,
            None,
            &LayoutOptions::default(),
            &GlyphAdvanceMeasurer,
        );
        assert_eq!(track.len(), 1);
        assert_eq!(track.events()[0].language, LanguageTag::Arabic);
        assert_eq!(track.events()[0].layout, LayoutHint::Center);
    }

    #[test]
    fn translation_stacks_below_arabic() {
        let alignments = vec![alignment(
            1,
            4000,
            vec![segment(1, "بسم الله", 0, 4000)],
            vec![segment(1, "In the name of God", 0, 4000)],
        )];
        let track = render(
            &alignments,
            Some(Language::English),
            &LayoutOptions::default(),
            &GlyphAdvanceMeasurer,
        );
        assert_eq!(track.len(), 2);
        assert_eq!(track.events_for(LanguageTag::Arabic).count(), 1);
        assert_eq!(
            track
                .events_for(LanguageTag::Translation(Language::English))
                .count(),
            1
        );
        let translation = track
            .events_for(LanguageTag::Translation(Language::English))
            .next()
            .unwrap();
        assert_eq!(translation.layout, LayoutHint::Bottom);
    }

    #[test]
    fn overlapping_segments_are_clamped_per_language() {
        let alignments = vec![
            alignment(1, 4000, vec![segment(1, "a", 0, 2500)], vec![]),
            // Starts before the previous verse's segment ended.
            alignment(2, 4000, vec![segment(2, "b", 2000, 5000)], vec![]),
        ];
        let track = render(
            &alignments,
            None,
            &LayoutOptions::default(),
            &GlyphAdvanceMeasurer,
        );
        assert_eq!(track.len(), 2);
        assert!(no_same_language_overlap(&track, LanguageTag::Arabic));
        assert_eq!(track.events()[1].start_ms, 2500);
    }

    #[test]
    fn events_are_ordered_by_start_time() {
        let alignments = vec![
            alignment(
                1,
                4000,
                vec![segment(1, "a", 0, 2000), segment(1, "b", 2000, 4000)],
                vec![segment(1, "t", 0, 4000)],
            ),
            alignment(2, 3000, vec![segment(2, "c", 4000, 7000)], vec![]),
        ];
        let track = render(
            &alignments,
            Some(Language::English),
            &LayoutOptions::default(),
            &GlyphAdvanceMeasurer,
        );
        let starts: Vec<u64> = track.events().iter().map(|e| e.start_ms).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn long_lines_are_wrapped() {
        let text = "Allah there is no deity except Him the Ever Living the Sustainer of all existence neither drowsiness overtakes Him nor sleep";
        let alignments = vec![alignment(
            255,
            10000,
            vec![],
            vec![segment(255, text, 0, 10000)],
        )];
        let track = render(
            &alignments,
            Some(Language::English),
            &LayoutOptions::default(),
            &GlyphAdvanceMeasurer,
        );
        let event = track.events().first().unwrap();
        assert!(event.text.contains('\n'));
        assert_eq!(event.text.replace('\n', " "), text);
    }
}
