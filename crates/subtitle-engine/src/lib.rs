//! Versecast Subtitle Engine
//!
//! Converts aligned text units into timed overlay tracks and serializes
//! them for the composition pipeline:
//! - Measurement-driven line wrapping for the portrait frame
//! - ASS output for burn-in (Arabic centered, translation stacked below)
//! - SRT sidecar export

pub mod ass;
pub mod layout;
pub mod srt;
pub mod track;

pub use ass::render_ass;
pub use layout::{GlyphAdvanceMeasurer, LayoutOptions, TextMeasurer};
pub use srt::{generate_srt, save_srt};
pub use track::{render, LanguageTag, LayoutHint, OverlayTrack, SubtitleEvent};
