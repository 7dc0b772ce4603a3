//! The final encode: background loop + subtitle burn-in + narration mux.
//!
//! One ffmpeg invocation produces the portrait H.264/AAC file. Progress is
//! streamed over `-progress pipe:1` and stderr is drained concurrently so
//! the encoder never blocks on a full pipe.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use versecast_common::config::CompositionDefaults;
use versecast_common::error::{VersecastError, VersecastResult};
use versecast_content_client::probe::command_exists;

use crate::audio::NarrationTrack;
use crate::background::Background;

/// Encoder parameters for one job.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub preset: String,
    pub crf: u32,
    pub audio_bitrate_kbps: u32,
}

impl EncodeSettings {
    pub fn from_defaults(defaults: &CompositionDefaults) -> Self {
        Self {
            width: defaults.width,
            height: defaults.height,
            fps: defaults.fps,
            preset: defaults.preset.clone(),
            crf: defaults.crf,
            audio_bitrate_kbps: defaults.audio_bitrate_kbps,
        }
    }
}

/// A fully planned encode invocation.
#[derive(Debug, Clone)]
pub struct EncodePlan {
    pub args: Vec<String>,
    pub expected_duration_ms: u64,
    pub output_path: PathBuf,
}

/// Progress callback: fraction of the encode completed, in `[0, 1]`.
pub type EncodeProgressFn = Box<dyn Fn(f64) + Send>;

/// Whether the media toolchain is available.
pub fn toolchain_available() -> bool {
    command_exists("ffmpeg") && command_exists("ffprobe")
}

/// Build the ffmpeg argument list for the final encode.
///
/// Clip backgrounds are looped endlessly (`-stream_loop -1`) and cut at the
/// narration length with `-t`, so the loop seam never produces a duration
/// mismatch. Solid backgrounds are synthesized at exactly the right length.
pub fn build_encode_plan(
    background: &Background,
    narration: &NarrationTrack,
    subtitle_path: &Path,
    settings: &EncodeSettings,
    output_path: &Path,
) -> EncodePlan {
    let duration_secs = narration.total_ms as f64 / 1000.0;

    let mut args: Vec<String> = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-nostats".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
    ];

    match background {
        Background::Clip(path) => {
            args.push("-stream_loop".to_string());
            args.push("-1".to_string());
            args.push("-i".to_string());
            args.push(path.display().to_string());
        }
        Background::Solid { color } => {
            args.push("-f".to_string());
            args.push("lavfi".to_string());
            args.push("-i".to_string());
            args.push(format!(
                "color=c={color}:s={}x{}:r={}:d={duration_secs:.3}",
                settings.width, settings.height, settings.fps
            ));
        }
    }

    args.push("-i".to_string());
    args.push(narration.path.display().to_string());

    let subtitle_filter = format!("ass='{}'", escape_filter_path(subtitle_path));
    let video_filter = match background {
        Background::Clip(_) => format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},{subtitle_filter}",
            w = settings.width,
            h = settings.height,
        ),
        Background::Solid { .. } => subtitle_filter,
    };
    args.push("-vf".to_string());
    args.push(video_filter);

    for arg in [
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        settings.fps.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", settings.audio_bitrate_kbps),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-t".to_string(),
        format!("{duration_secs:.3}"),
    ] {
        args.push(arg);
    }

    args.push(output_path.display().to_string());

    EncodePlan {
        args,
        expected_duration_ms: narration.total_ms,
        output_path: output_path.to_path_buf(),
    }
}

/// Run the encode, reporting progress until the process exits.
///
/// Runs to completion or hard failure; there is no mid-encode cancellation,
/// which keeps half-written files out of the output directory.
pub fn run_encode(plan: &EncodePlan, progress: Option<EncodeProgressFn>) -> VersecastResult<()> {
    tracing::debug!(args = ?plan.args, "Running ffmpeg encode");
    let mut child = Command::new("ffmpeg")
        .args(&plan.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VersecastError::composition(format!("Failed to start ffmpeg: {e}")))?;

    tracing::info!(
        pid = child.id(),
        expected_duration_ms = plan.expected_duration_ms,
        "ffmpeg encode started"
    );

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| VersecastError::composition("Failed to capture ffmpeg stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| VersecastError::composition("Failed to capture ffmpeg stderr"))?;

    // Drain stderr concurrently to avoid ffmpeg blocking on a full pipe.
    let stderr_task = std::thread::spawn(move || -> String {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    });

    let mut reader = BufReader::new(stdout);
    let mut line = String::new();
    let mut state = ProgressState::default();
    loop {
        line.clear();
        let bytes = reader.read_line(&mut line).map_err(|e| {
            VersecastError::composition(format!("Failed reading ffmpeg progress: {e}"))
        })?;
        if bytes == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some((key, value)) = trimmed.split_once('=') {
            state.update(key, value);
            if key == "progress" {
                if let Some(cb) = &progress {
                    cb(state.fraction(plan.expected_duration_ms));
                }
            }
        }
    }

    let status = child
        .wait()
        .map_err(|e| VersecastError::composition(format!("Failed to wait on ffmpeg: {e}")))?;

    let stderr_output = stderr_task
        .join()
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

    if !status.success() {
        return Err(VersecastError::composition(format!(
            "ffmpeg encode failed (status {}): {}",
            status,
            stderr_output.trim()
        )));
    }

    if let Some(cb) = &progress {
        cb(1.0);
    }
    Ok(())
}

/// Escape a path for use inside an ffmpeg filter argument.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}

/// Accumulated `-progress pipe:1` key/value state.
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports both keys in microseconds.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, expected_duration_ms: u64) -> f64 {
        if self.complete {
            return 1.0;
        }
        if expected_duration_ms == 0 {
            return 0.0;
        }
        (self.out_time_secs * 1000.0 / expected_duration_ms as f64).clamp(0.0, 1.0)
    }
}
