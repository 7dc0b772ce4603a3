//! Observable, cancellable job handles.
//!
//! A spawned composition reports a finite sequence of progress events
//! followed by exactly one terminal event. Cancellation is honored at
//! stage boundaries before the encode starts; the encode itself runs to
//! completion or failure so no corrupt output can appear.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use versecast_common::error::ErrorKind;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preflight,
    Resolving,
    Narration,
    Aligning,
    Subtitles,
    Background,
    Encoding,
    Finalizing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preflight => "preflight",
            Stage::Resolving => "resolving",
            Stage::Narration => "narration",
            Stage::Aligning => "aligning",
            Stage::Subtitles => "subtitles",
            Stage::Background => "background",
            Stage::Encoding => "encoding",
            Stage::Finalizing => "finalizing",
        }
    }
}

/// A progress report: current stage plus overall percentage.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub percent: f64,
}

/// Everything a job observer can see.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Completed(PathBuf),
    Failed { kind: ErrorKind, message: String },
    Cancelled,
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

/// Terminal result of a job, for callers who only want the outcome.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(PathBuf),
    Failed { kind: ErrorKind, message: String },
    Cancelled,
}

/// Detached cancellation capability for a job.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation. Takes effect at the next stage boundary;
    /// a running encode is never interrupted.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Handle to a spawned composition job.
pub struct CompositionHandle {
    pub(crate) events: mpsc::UnboundedReceiver<JobEvent>,
    pub(crate) cancel: Arc<AtomicBool>,
}

impl CompositionHandle {
    /// Request cancellation. Takes effect at the next stage boundary;
    /// a running encode is never interrupted.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// A cancellation handle usable while this handle is mutably borrowed
    /// for event consumption.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancel),
        }
    }

    /// Next event, or `None` once the terminal event has been consumed.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Drain events until the terminal one.
    pub async fn wait(mut self) -> JobOutcome {
        while let Some(event) = self.next_event().await {
            match event {
                JobEvent::Progress(_) => {}
                JobEvent::Completed(path) => return JobOutcome::Completed(path),
                JobEvent::Failed { kind, message } => return JobOutcome::Failed { kind, message },
                JobEvent::Cancelled => return JobOutcome::Cancelled,
            }
        }
        JobOutcome::Failed {
            kind: ErrorKind::Other,
            message: "job ended without a terminal event".to_string(),
        }
    }
}

/// Job-side counterpart of the handle.
#[derive(Clone)]
pub(crate) struct JobContext {
    pub(crate) tx: mpsc::UnboundedSender<JobEvent>,
    pub(crate) cancel: Arc<AtomicBool>,
}

impl JobContext {
    pub(crate) fn progress(&self, stage: Stage, percent: f64) {
        let _ = self.tx.send(JobEvent::Progress(ProgressEvent {
            stage,
            percent: percent.clamp(0.0, 100.0),
        }));
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is requested.
    pub(crate) async fn cancelled_wait(&self) {
        while !self.is_cancelled() {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }
}
