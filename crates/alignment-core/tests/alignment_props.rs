//! Property tests for the alignment invariants.

use std::path::PathBuf;

use proptest::prelude::*;
use versecast_alignment_core::{align_verse, AlignmentOptions};
use versecast_verse_model::timing::segments_well_formed;
use versecast_verse_model::{VerseRecord, VerseRef};

fn record(text: String, duration_ms: u64) -> VerseRecord {
    VerseRecord {
        verse: VerseRef { surah: 1, ayah: 1 },
        arabic_text: text,
        translation: None,
        translation_language: None,
        audio_key: "audio/ar.alafasy/1/1".to_string(),
        audio_path: PathBuf::from("/tmp/a.mp3"),
        duration_ms,
        timing: None,
    }
}

fn arb_text() -> impl Strategy<Value = String> {
    // Words of 1-12 Arabic letters, 1-40 words.
    prop::collection::vec("[\u{0627}-\u{064a}]{1,12}", 1..40).prop_map(|words| words.join(" "))
}

fn arb_options() -> impl Strategy<Value = AlignmentOptions> {
    (0u64..2000, 0usize..12).prop_map(|(min_segment_ms, words_per_segment)| AlignmentOptions {
        min_segment_ms,
        words_per_segment,
    })
}

proptest! {
    #[test]
    fn segments_stay_within_the_audio_window(
        text in arb_text(),
        duration_ms in 1u64..600_000,
        options in arb_options(),
    ) {
        let alignment = align_verse(&record(text, duration_ms), &options);

        prop_assert!(segments_well_formed(&alignment.arabic, duration_ms));
        if let Some(first) = alignment.arabic.first() {
            prop_assert_eq!(first.start_ms, 0);
        }
        if let Some(last) = alignment.arabic.last() {
            prop_assert!(last.end_ms <= duration_ms);
        }
    }

    #[test]
    fn no_words_are_lost(
        text in arb_text(),
        duration_ms in 1_000u64..600_000,
        options in arb_options(),
    ) {
        let alignment = align_verse(&record(text.clone(), duration_ms), &options);

        let original: Vec<&str> = text.split_whitespace().collect();
        let aligned: Vec<&str> = alignment
            .arabic
            .iter()
            .flat_map(|s| s.text.split_whitespace())
            .collect();
        // With at least one second of audio every unit gets a non-zero
        // share, so the full word sequence survives segmentation.
        prop_assert_eq!(original, aligned);
    }

    #[test]
    fn alignment_is_a_pure_function(
        text in arb_text(),
        duration_ms in 1u64..600_000,
        options in arb_options(),
    ) {
        let rec = record(text, duration_ms);
        let a = align_verse(&rec, &options);
        let b = align_verse(&rec, &options);
        prop_assert_eq!(a.arabic, b.arabic);
    }
}
