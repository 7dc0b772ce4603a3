//! Versecast Compose Engine
//!
//! Turns a composition job into a finished portrait video: narration
//! concatenation, timing alignment on the cumulative timeline, subtitle
//! burn-in, background looping, and the final H.264/AAC encode, all
//! reported through an observable, cancellable job handle.

pub mod audio;
pub mod background;
pub mod encode;
pub mod pipeline;
pub mod progress;

pub use audio::{compute_offsets, concat_narration, NarrationTrack};
pub use background::{select_background, Background, BACKGROUND_EXTENSIONS, FALLBACK_COLOR};
pub use encode::{build_encode_plan, run_encode, toolchain_available, EncodePlan, EncodeSettings};
pub use pipeline::Composer;
pub use progress::{CancelHandle, CompositionHandle, JobEvent, JobOutcome, ProgressEvent, Stage};
