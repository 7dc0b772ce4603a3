//! Timed subtitle units and provider timing metadata.

use serde::{Deserialize, Serialize};

use crate::verse::VerseRef;

/// One span of authoritative timing metadata from the content provider,
/// relative to the start of its verse's audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSpan {
    /// Text covered by this span.
    pub text: String,

    /// Start offset in milliseconds.
    pub start_ms: u64,

    /// End offset in milliseconds.
    pub end_ms: u64,
}

/// One aligned subtitle unit.
///
/// Within a verse, segments are contiguous, non-overlapping, and ordered;
/// after offset-shifting onto the narration timeline the same holds across
/// verses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// Verse this segment belongs to.
    pub verse: VerseRef,

    /// Subtitle text.
    pub text: String,

    /// Start in milliseconds.
    pub start_ms: u64,

    /// End in milliseconds. Always greater than `start_ms`.
    pub end_ms: u64,
}

impl TimedSegment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Check the per-verse segment invariant: sorted, non-overlapping,
/// each strictly positive, all within `[0, duration_ms]`.
pub fn segments_well_formed(segments: &[TimedSegment], duration_ms: u64) -> bool {
    let mut previous_end = 0u64;
    for segment in segments {
        if segment.start_ms >= segment.end_ms {
            return false;
        }
        if segment.start_ms < previous_end {
            return false;
        }
        previous_end = segment.end_ms;
    }
    previous_end <= duration_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start_ms: u64, end_ms: u64) -> TimedSegment {
        TimedSegment {
            verse: VerseRef { surah: 1, ayah: 1 },
            text: "x".to_string(),
            start_ms,
            end_ms,
        }
    }

    #[test]
    fn well_formed_accepts_contiguous_segments() {
        assert!(segments_well_formed(&[seg(0, 500), seg(500, 900)], 1000));
        assert!(segments_well_formed(&[], 0));
    }

    #[test]
    fn well_formed_rejects_overlap_and_overflow() {
        assert!(!segments_well_formed(&[seg(0, 600), seg(500, 900)], 1000));
        assert!(!segments_well_formed(&[seg(0, 1200)], 1000));
        assert!(!segments_well_formed(&[seg(300, 300)], 1000));
    }
}
