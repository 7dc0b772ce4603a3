//! Versecast Content Client
//!
//! Resolves verse references to recitation audio and text/translation
//! records. Lookups are cache-first with checksum-verified hits; misses go
//! to the remote provider with bounded concurrency and retry/backoff, and
//! results are normalized into canonical [`versecast_verse_model::VerseRecord`]s
//! in request order.

pub mod client;
pub mod probe;
pub mod source;

pub use client::ContentClient;
pub use probe::{command_exists, media_duration_ms, DurationProbe, FfprobeDurationProbe, FixedDurationProbe};
pub use source::{ContentSource, HttpContentSource, ProviderVerse};
