//! Versecast Alignment Core
//!
//! Computes start/end timestamps for subtitle units against a verse's audio
//! duration. Pure and deterministic: the same record and options always
//! produce the same segments, with no clock or randomness involved.

pub mod align;

pub use align::{align_verse, offset_segments, AlignmentOptions, VerseAlignment};
