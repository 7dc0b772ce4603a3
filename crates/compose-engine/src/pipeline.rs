//! The composition pipeline orchestrator.
//!
//! One `Composer` owns the content client, cache, and configuration, and
//! spawns observable jobs. Fetch, alignment, subtitle rendering, and the
//! encode run inside a per-job scratch directory that is removed on every
//! exit path; the finished file reaches the output directory only through
//! an atomic rename.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, Mutex};
use versecast_alignment_core::{align_verse, offset_segments, AlignmentOptions};
use versecast_asset_cache::{AssetCache, CacheKey};
use versecast_common::config::AppConfig;
use versecast_common::error::{VersecastError, VersecastResult};
use versecast_content_client::{ContentClient, FfprobeDurationProbe, HttpContentSource};
use versecast_subtitle_engine::{render, render_ass, save_srt, GlyphAdvanceMeasurer, LayoutOptions};
use versecast_verse_model::{CompositionJob, VerseRecord};

use crate::audio::concat_narration;
use crate::background::select_background;
use crate::encode::{build_encode_plan, run_encode, EncodeSettings};
use crate::progress::{CompositionHandle, JobContext, JobEvent, Stage};

/// Why a job stopped before completing.
enum JobInterrupt {
    Cancelled,
    Failed(VersecastError),
}

impl From<VersecastError> for JobInterrupt {
    fn from(e: VersecastError) -> Self {
        JobInterrupt::Failed(e)
    }
}

/// Owns the pipeline dependencies and spawns composition jobs.
#[derive(Clone)]
pub struct Composer {
    client: ContentClient,
    cache: Arc<AssetCache>,
    config: AppConfig,
    /// Video encoding is resource-intensive; one encode at a time.
    encode_lock: Arc<Mutex<()>>,
}

impl Composer {
    pub fn new(client: ContentClient, cache: Arc<AssetCache>, config: AppConfig) -> Self {
        Self {
            client,
            cache,
            config,
            encode_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build the production stack: filesystem cache, HTTP provider,
    /// ffprobe duration probe.
    pub fn from_config(config: AppConfig) -> VersecastResult<Self> {
        let cache = Arc::new(AssetCache::open_fs(
            &config.cache.dir,
            config.cache.max_bytes,
        )?);
        let source = Arc::new(HttpContentSource::new(&config.fetch)?);
        let client = ContentClient::new(
            source,
            Arc::clone(&cache),
            Arc::new(FfprobeDurationProbe),
            config.fetch.clone(),
        );
        Ok(Self::new(client, cache, config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.cache
    }

    /// Spawn a job and return its observable handle. The handle's event
    /// stream is finite with exactly one terminal event.
    pub fn spawn(&self, job: CompositionJob) -> CompositionHandle {
        let (tx, events) = mpsc::unbounded_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let ctx = JobContext {
            tx,
            cancel: Arc::clone(&cancel),
        };
        let composer = self.clone();

        tokio::spawn(async move {
            tracing::info!(
                verses = job.verses.len(),
                reciter = %job.reciter,
                "Composition job started"
            );
            let terminal = match composer.run(&job, &ctx).await {
                Ok(path) => JobEvent::Completed(path),
                Err(JobInterrupt::Cancelled) => {
                    tracing::info!("Composition job cancelled");
                    JobEvent::Cancelled
                }
                Err(JobInterrupt::Failed(e)) => {
                    tracing::error!(error = %e, "Composition job failed");
                    JobEvent::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };
            let _ = ctx.tx.send(terminal);
        });

        CompositionHandle { events, cancel }
    }

    async fn run(&self, job: &CompositionJob, ctx: &JobContext) -> Result<PathBuf, JobInterrupt> {
        checkpoint(ctx)?;
        ctx.progress(Stage::Preflight, 2.0);
        preflight_storage(&self.config)?;

        // Dropped on every exit path, taking all intermediates with it.
        let work = tempfile::tempdir().map_err(VersecastError::from)?;

        // Assets this job depends on must survive eviction until it ends.
        let mut keys = Vec::with_capacity(job.verses.len() * 2);
        for verse in &job.verses {
            keys.push(CacheKey::audio(*verse, job.reciter));
            keys.push(CacheKey::text(*verse, job.reciter, job.translation));
        }
        let _pin = self.cache.pin(&keys);

        ctx.progress(Stage::Resolving, 5.0);
        let mut records = tokio::select! {
            result = self
                .client
                .resolve(&job.verses, job.reciter, job.translation, work.path()) => result?,
            _ = ctx.cancelled_wait() => return Err(JobInterrupt::Cancelled),
        };
        ctx.progress(Stage::Resolving, 40.0);

        trim_to_duration_budget(
            &mut records,
            self.config.composition.max_duration_secs.saturating_mul(1000),
        );

        checkpoint(ctx)?;
        ctx.progress(Stage::Narration, 45.0);
        let narration = concat_narration(&records, work.path())?;

        ctx.progress(Stage::Aligning, 52.0);
        let options = AlignmentOptions {
            min_segment_ms: self.config.composition.min_segment_ms,
            words_per_segment: self.config.composition.words_per_segment,
        };
        let mut alignments = Vec::with_capacity(records.len());
        for (record, offset) in records.iter().zip(&narration.verse_offsets_ms) {
            let mut alignment = align_verse(record, &options);
            offset_segments(&mut alignment.arabic, *offset);
            offset_segments(&mut alignment.translation, *offset);
            alignments.push(alignment);
        }

        ctx.progress(Stage::Subtitles, 58.0);
        let layout = LayoutOptions {
            frame_width_px: self.config.composition.width,
            frame_height_px: self.config.composition.height,
            ..LayoutOptions::default()
        };
        let track = render(&alignments, job.translation, &layout, &GlyphAdvanceMeasurer);
        let subtitle_path = work.path().join("subtitles.ass");
        std::fs::write(&subtitle_path, render_ass(&track, &layout)).map_err(VersecastError::from)?;

        ctx.progress(Stage::Background, 62.0);
        let mut rng = StdRng::from_entropy();
        let background = select_background(
            &self.config.backgrounds_dir,
            job.background_theme.as_deref(),
            &mut rng,
        );

        // Last cancellation point: the encode always runs to completion.
        checkpoint(ctx)?;
        ctx.progress(Stage::Encoding, 65.0);
        let settings = EncodeSettings::from_defaults(&self.config.composition);
        let encoded_path = work.path().join("output.mp4");
        let plan = build_encode_plan(&background, &narration, &subtitle_path, &settings, &encoded_path);

        let _encode_guard = self.encode_lock.lock().await;
        let encode_ctx = ctx.clone();
        let encode_plan = plan.clone();
        tokio::task::spawn_blocking(move || {
            run_encode(
                &encode_plan,
                Some(Box::new(move |fraction| {
                    encode_ctx.progress(Stage::Encoding, 65.0 + fraction * 30.0);
                })),
            )
        })
        .await
        .map_err(|e| VersecastError::from(anyhow::anyhow!("encode task failed: {e}")))??;

        ctx.progress(Stage::Finalizing, 97.0);
        let final_path = publish_output(&encoded_path, &job.output_dir, &output_filename(job))?;
        save_srt(&track, &final_path.with_extension("srt"))?;
        ctx.progress(Stage::Finalizing, 100.0);

        tracing::info!(
            output = %final_path.display(),
            duration_ms = narration.total_ms,
            "Composition finished"
        );
        Ok(final_path)
    }
}

fn checkpoint(ctx: &JobContext) -> Result<(), JobInterrupt> {
    if ctx.is_cancelled() {
        Err(JobInterrupt::Cancelled)
    } else {
        Ok(())
    }
}

/// Fail before any fetch or encode work if the output volume cannot hold a
/// worst-case result.
fn preflight_storage(config: &AppConfig) -> VersecastResult<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let available = fs2::available_space(&config.output_dir)?;
    let needed = estimated_output_bytes(config.composition.max_duration_secs);
    if available < needed {
        return Err(VersecastError::InsufficientStorage {
            needed_bytes: needed,
            available_bytes: available,
        });
    }
    Ok(())
}

/// Upper bound for CRF-encoded portrait H.264 plus scratch copies; real
/// outputs land well under 500 KB/s at the default CRF.
fn estimated_output_bytes(max_duration_secs: u64) -> u64 {
    max_duration_secs.saturating_mul(1_000_000)
}

/// Stop adding verses once the narration would exceed the budget, always
/// keeping at least one.
fn trim_to_duration_budget(records: &mut Vec<VerseRecord>, max_ms: u64) {
    if max_ms == 0 || records.is_empty() {
        return;
    }
    let mut total = 0u64;
    let mut keep = 0usize;
    for record in records.iter() {
        if keep > 0 && total + record.duration_ms > max_ms {
            break;
        }
        total += record.duration_ms;
        keep += 1;
    }
    if keep < records.len() {
        tracing::info!(
            kept = keep,
            dropped = records.len() - keep,
            total_ms = total,
            "Trimmed verse list to the duration budget"
        );
        records.truncate(keep);
    }
}

/// `{SurahName} {Reciter} {surah}_{from}-{to} {job-id}.mp4`
fn output_filename(job: &CompositionJob) -> String {
    if let Some(name) = &job.output_filename {
        return name.clone();
    }
    let (first, last) = job.verse_span();
    format!(
        "{} {} {}_{}-{} {}.mp4",
        first.surah_name(),
        job.reciter.short_name(),
        first.surah,
        first.ayah,
        last.ayah,
        job_id(),
    )
}

/// Timestamp plus a random suffix; collisions would need two jobs in the
/// same second to draw the same 16 bits.
fn job_id() -> String {
    format!(
        "{}-{:04x}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        rand::random::<u16>()
    )
}

/// Copy the encoded file next to its final name, then rename atomically.
/// The user-visible directory never holds a partial result under the final
/// name.
fn publish_output(encoded: &Path, output_dir: &Path, filename: &str) -> VersecastResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let final_path = output_dir.join(filename);
    let staging = output_dir.join(format!(".{filename}.part"));

    if let Err(e) = std::fs::copy(encoded, &staging) {
        std::fs::remove_file(&staging).ok();
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&staging, &final_path) {
        std::fs::remove_file(&staging).ok();
        return Err(e.into());
    }
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use versecast_verse_model::{Reciter, VerseRef};

    fn record(ayah: u16, duration_ms: u64) -> VerseRecord {
        VerseRecord {
            verse: VerseRef { surah: 18, ayah },
            arabic_text: "نص".to_string(),
            translation: None,
            translation_language: None,
            audio_key: format!("audio/ar.alafasy/18/{ayah}"),
            audio_path: PathBuf::from(format!("/tmp/{ayah}.mp3")),
            duration_ms,
            timing: None,
        }
    }

    #[test]
    fn trim_stops_before_exceeding_the_budget() {
        let mut records = vec![record(1, 40_000), record(2, 40_000), record(3, 40_000)];
        trim_to_duration_budget(&mut records, 100_000);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn trim_always_keeps_the_first_verse() {
        let mut records = vec![record(1, 500_000), record(2, 10_000)];
        trim_to_duration_budget(&mut records, 100_000);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].verse.ayah, 1);
    }

    #[test]
    fn trim_keeps_everything_within_budget() {
        let mut records = vec![record(1, 10_000), record(2, 10_000)];
        trim_to_duration_budget(&mut records, 100_000);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn output_filename_includes_surah_reciter_and_range() {
        let job = CompositionJob::from_range(
            18,
            1,
            10,
            Reciter::Sudais,
            None,
            PathBuf::from("/tmp/out"),
        )
        .unwrap();
        let name = output_filename(&job);
        assert!(name.starts_with("Al-Kahf Sudais 18_1-10 "));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn explicit_output_filename_wins() {
        let mut job = CompositionJob::from_range(
            1,
            1,
            7,
            Reciter::Alafasy,
            None,
            PathBuf::from("/tmp/out"),
        )
        .unwrap();
        job.output_filename = Some("custom.mp4".to_string());
        assert_eq!(output_filename(&job), "custom.mp4");
    }

    #[test]
    fn publish_leaves_no_staging_file_behind() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let encoded = work.path().join("output.mp4");
        std::fs::write(&encoded, b"video bytes").unwrap();

        let published = publish_output(&encoded, out.path(), "final.mp4").unwrap();
        assert_eq!(published, out.path().join("final.mp4"));
        assert_eq!(std::fs::read(&published).unwrap(), b"video bytes");

        let leftovers: Vec<_> = std::fs::read_dir(out.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn publish_fails_cleanly_when_source_is_missing() {
        let out = tempfile::tempdir().unwrap();
        let err = publish_output(Path::new("/nonexistent/output.mp4"), out.path(), "x.mp4");
        assert!(err.is_err());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn storage_estimate_scales_with_duration() {
        assert!(estimated_output_bytes(100) > estimated_output_bytes(10));
        assert!(estimated_output_bytes(100) >= 50 * 1_000_000);
    }
}
