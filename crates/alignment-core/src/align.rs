//! Timing alignment for subtitle units.
//!
//! Two paths: authoritative provider timing metadata is used verbatim
//! (repaired only where it violates the audio window), otherwise timing is
//! estimated by distributing the audio duration over text units
//! proportionally to their character weight. Both paths are pure functions
//! of their inputs.

use serde::{Deserialize, Serialize};
use versecast_verse_model::{TimedSegment, TimingSpan, VerseRecord, VerseRef};

/// Tunables for the estimation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentOptions {
    /// Minimum on-screen duration per segment. Estimated segments shorter
    /// than this are stretched, then everything is compressed back if the
    /// verse's audio is too short to honor the floor.
    pub min_segment_ms: u64,

    /// Number of words grouped into one subtitle unit. Zero keeps the whole
    /// verse as a single unit.
    pub words_per_segment: usize,
}

impl Default for AlignmentOptions {
    fn default() -> Self {
        Self {
            min_segment_ms: 500,
            words_per_segment: 8,
        }
    }
}

/// Aligned subtitle tracks for one verse, still in verse-local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerseAlignment {
    pub verse: VerseRef,

    /// Audio duration the segments were aligned against.
    pub duration_ms: u64,

    /// Arabic segments, contiguous and non-overlapping within
    /// `[0, duration_ms]`.
    pub arabic: Vec<TimedSegment>,

    /// Translation segments over the same window; empty when the record has
    /// no translation. Always estimated proportionally, even when the
    /// Arabic side has authoritative metadata.
    pub translation: Vec<TimedSegment>,
}

/// Align one verse record.
pub fn align_verse(record: &VerseRecord, options: &AlignmentOptions) -> VerseAlignment {
    let arabic = match &record.timing {
        Some(spans) if !spans.is_empty() => {
            segments_from_metadata(record.verse, spans, record.duration_ms)
        }
        _ => estimate_segments(
            record.verse,
            &record.arabic_text,
            record.duration_ms,
            options,
        ),
    };

    let translation = record
        .translation
        .as_deref()
        .map(|text| estimate_segments(record.verse, text, record.duration_ms, options))
        .unwrap_or_default();

    VerseAlignment {
        verse: record.verse,
        duration_ms: record.duration_ms,
        arabic,
        translation,
    }
}

/// Shift a verse's segments onto the cumulative narration timeline.
pub fn offset_segments(segments: &mut [TimedSegment], offset_ms: u64) {
    for segment in segments {
        segment.start_ms += offset_ms;
        segment.end_ms += offset_ms;
    }
}

/// Use provider timing spans verbatim, repaired to fit the audio window:
/// sorted, clamped to `[0, duration_ms]`, overlaps resolved by pushing a
/// late span's start to its predecessor's end.
fn segments_from_metadata(
    verse: VerseRef,
    spans: &[TimingSpan],
    duration_ms: u64,
) -> Vec<TimedSegment> {
    let mut spans: Vec<&TimingSpan> = spans.iter().collect();
    spans.sort_by_key(|s| (s.start_ms, s.end_ms));

    let mut segments = Vec::with_capacity(spans.len());
    let mut previous_end = 0u64;
    for span in spans {
        let start = span.start_ms.max(previous_end);
        let end = span.end_ms.min(duration_ms);
        if start >= end || span.text.trim().is_empty() {
            continue;
        }
        previous_end = end;
        segments.push(TimedSegment {
            verse,
            text: span.text.trim().to_string(),
            start_ms: start,
            end_ms: end,
        });
    }
    segments
}

/// Distribute `duration_ms` over text units proportionally to character
/// weight, honoring the per-unit floor where the audio allows it.
fn estimate_segments(
    verse: VerseRef,
    text: &str,
    duration_ms: u64,
    options: &AlignmentOptions,
) -> Vec<TimedSegment> {
    let units = split_units(text, options.words_per_segment);
    if units.is_empty() || duration_ms == 0 {
        return Vec::new();
    }

    let weights: Vec<f64> = units
        .iter()
        .map(|unit| unit.chars().filter(|c| !c.is_whitespace()).count().max(1) as f64)
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let raw: Vec<f64> = weights
        .iter()
        .map(|w| duration_ms as f64 * w / total_weight)
        .collect();

    // Apply the floor, then compress everything proportionally if the floor
    // pushed the total past the audio duration.
    let floored: Vec<f64> = raw
        .iter()
        .map(|d| d.max(options.min_segment_ms as f64))
        .collect();
    let total_floored: f64 = floored.iter().sum();
    let scale = if total_floored > duration_ms as f64 {
        duration_ms as f64 / total_floored
    } else {
        1.0
    };

    let mut segments = Vec::with_capacity(units.len());
    let mut acc = 0.0f64;
    for (unit, d) in units.into_iter().zip(floored) {
        let start_ms = acc.round() as u64;
        acc += d * scale;
        let end_ms = (acc.round() as u64).min(duration_ms);
        if end_ms > start_ms {
            segments.push(TimedSegment {
                verse,
                text: unit,
                start_ms,
                end_ms,
            });
        }
    }
    segments
}

/// Group whitespace-separated words into units of `words_per_unit`
/// (0 = one unit for the whole text).
fn split_units(text: &str, words_per_unit: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words_per_unit == 0 {
        return vec![words.join(" ")];
    }
    words
        .chunks(words_per_unit)
        .map(|chunk| chunk.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use versecast_verse_model::VerseRecord;

    fn verse() -> VerseRef {
        VerseRef { surah: 2, ayah: 255 }
    }

    fn record(text: &str, duration_ms: u64, timing: Option<Vec<TimingSpan>>) -> VerseRecord {
        VerseRecord {
            verse: verse(),
            arabic_text: text.to_string(),
            translation: None,
            translation_language: None,
            audio_key: "audio/ar.alafasy/2/255".to_string(),
            audio_path: PathBuf::from("/tmp/audio.mp3"),
            duration_ms,
            timing,
        }
    }

    #[test]
    fn whole_verse_is_one_segment_when_grouping_disabled() {
        let options = AlignmentOptions {
            words_per_segment: 0,
            ..Default::default()
        };
        let alignment = align_verse(&record("بسم الله الرحمن الرحيم", 4000, None), &options);
        assert_eq!(alignment.arabic.len(), 1);
        assert_eq!(alignment.arabic[0].start_ms, 0);
        assert_eq!(alignment.arabic[0].end_ms, 4000);
    }

    #[test]
    fn estimation_spans_the_full_audio_window() {
        let options = AlignmentOptions {
            words_per_segment: 2,
            ..Default::default()
        };
        let alignment = align_verse(
            &record("الله لا اله الا هو الحي القيوم", 14000, None),
            &options,
        );
        assert!(alignment.arabic.len() > 1);
        assert_eq!(alignment.arabic.first().unwrap().start_ms, 0);
        assert_eq!(alignment.arabic.last().unwrap().end_ms, 14000);
        assert!(versecast_verse_model::timing::segments_well_formed(
            &alignment.arabic,
            14000
        ));
    }

    #[test]
    fn longer_units_get_more_time() {
        let options = AlignmentOptions {
            min_segment_ms: 0,
            words_per_segment: 1,
        };
        let alignment = align_verse(&record("اب اباباباباباب", 9000, None), &options);
        assert_eq!(alignment.arabic.len(), 2);
        assert!(alignment.arabic[1].duration_ms() > alignment.arabic[0].duration_ms());
    }

    #[test]
    fn floor_lifts_short_segments_toward_the_minimum() {
        let options = AlignmentOptions {
            min_segment_ms: 500,
            words_per_segment: 1,
        };
        // One tiny word next to a huge one: its proportional share of
        // 10 s would be ~227 ms, far below the floor.
        let alignment = align_verse(
            &record("ا ابابابابابابابابابابابابابابابابابابابابابا", 10_000, None),
            &options,
        );
        let short = &alignment.arabic[0];
        assert!(short.duration_ms() > 400);
        assert!(alignment.arabic.last().unwrap().end_ms <= 10_000);
    }

    #[test]
    fn floor_overflow_compresses_back_into_the_window() {
        let options = AlignmentOptions {
            min_segment_ms: 500,
            words_per_segment: 1,
        };
        // Ten words in one second: floors alone would need five seconds.
        let alignment = align_verse(&record("ا ب ج د ه و ز ح ط ي", 1000, None), &options);
        assert!(!alignment.arabic.is_empty());
        assert!(alignment.arabic.last().unwrap().end_ms <= 1000);
        assert!(versecast_verse_model::timing::segments_well_formed(
            &alignment.arabic,
            1000
        ));
    }

    #[test]
    fn metadata_is_used_verbatim() {
        let timing = vec![
            TimingSpan {
                text: "بسم".to_string(),
                start_ms: 120,
                end_ms: 900,
            },
            TimingSpan {
                text: "الله".to_string(),
                start_ms: 900,
                end_ms: 2100,
            },
        ];
        let alignment = align_verse(
            &record("بسم الله", 4000, Some(timing)),
            &AlignmentOptions::default(),
        );
        assert_eq!(alignment.arabic.len(), 2);
        assert_eq!(alignment.arabic[0].start_ms, 120);
        assert_eq!(alignment.arabic[0].end_ms, 900);
        assert_eq!(alignment.arabic[1].end_ms, 2100);
    }

    #[test]
    fn metadata_is_repaired_to_fit_the_window() {
        let timing = vec![
            TimingSpan {
                text: "a".to_string(),
                start_ms: 0,
                end_ms: 1500,
            },
            TimingSpan {
                text: "b".to_string(),
                start_ms: 1000, // overlaps predecessor
                end_ms: 9000,   // past the audio end
            },
        ];
        let alignment = align_verse(
            &record("a b", 3000, Some(timing)),
            &AlignmentOptions::default(),
        );
        assert_eq!(alignment.arabic.len(), 2);
        assert_eq!(alignment.arabic[1].start_ms, 1500);
        assert_eq!(alignment.arabic[1].end_ms, 3000);
        assert!(versecast_verse_model::timing::segments_well_formed(
            &alignment.arabic,
            3000
        ));
    }

    #[test]
    fn translation_is_estimated_even_with_arabic_metadata() {
        let timing = vec![TimingSpan {
            text: "بسم".to_string(),
            start_ms: 0,
            end_ms: 4000,
        }];
        let mut rec = record("بسم", 4000, Some(timing));
        rec.translation = Some("In the name of God".to_string());
        rec.translation_language = Some(versecast_verse_model::Language::English);

        let alignment = align_verse(&rec, &AlignmentOptions::default());
        assert!(!alignment.translation.is_empty());
        assert_eq!(alignment.translation.first().unwrap().start_ms, 0);
        assert_eq!(alignment.translation.last().unwrap().end_ms, 4000);
    }

    #[test]
    fn empty_text_or_zero_duration_yields_no_segments() {
        let options = AlignmentOptions::default();
        assert!(align_verse(&record("", 4000, None), &options)
            .arabic
            .is_empty());
        assert!(align_verse(&record("نص", 0, None), &options)
            .arabic
            .is_empty());
    }

    #[test]
    fn alignment_is_deterministic() {
        let options = AlignmentOptions::default();
        let rec = record("الله لا اله الا هو الحي القيوم لا تاخذه سنة ولا نوم", 27000, None);
        let a = align_verse(&rec, &options);
        let b = align_verse(&rec, &options);
        assert_eq!(a.arabic, b.arabic);
    }

    #[test]
    fn offsetting_shifts_both_bounds() {
        let mut segments = vec![TimedSegment {
            verse: verse(),
            text: "x".to_string(),
            start_ms: 100,
            end_ms: 900,
        }];
        offset_segments(&mut segments, 5000);
        assert_eq!(segments[0].start_ms, 5100);
        assert_eq!(segments[0].end_ms, 5900);
    }
}
