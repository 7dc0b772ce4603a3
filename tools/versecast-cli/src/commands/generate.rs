//! Generate a video for an explicit verse range.

use std::io::Write;
use std::path::PathBuf;

use versecast_common::config::AppConfig;
use versecast_compose_engine::{Composer, CompositionHandle, JobEvent};
use versecast_verse_model::{CompositionJob, Language, Reciter};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: AppConfig,
    surah: u16,
    from: u16,
    to: Option<u16>,
    reciter: String,
    language: Option<String>,
    output: Option<PathBuf>,
    filename: Option<String>,
    theme: Option<String>,
) -> anyhow::Result<()> {
    // Unknown reciters and languages are rejected here, before any work.
    let reciter: Reciter = reciter.parse()?;
    let translation: Option<Language> = language.map(|l| l.parse()).transpose()?;
    let to = to.unwrap_or(from);
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());

    let mut job = CompositionJob::from_range(surah, from, to, reciter, translation, output_dir)?;
    job.output_filename = filename;
    job.background_theme = theme;

    println!(
        "Generating Surah {surah} ({}), ayahs {from}-{to}",
        job.verses[0].surah_name()
    );
    println!("  Reciter: {reciter}");
    if let Some(language) = translation {
        println!("  Translation: {language}");
    }

    let composer = Composer::from_config(config)?;
    let handle = composer.spawn(job);
    watch(handle).await
}

/// Print progress until the terminal event; Ctrl-C requests cancellation.
pub(crate) async fn watch(mut handle: CompositionHandle) -> anyhow::Result<()> {
    let canceller = handle.cancel_handle();
    loop {
        let event = tokio::select! {
            event = handle.next_event() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("\nCancelling (encodes run to completion)...");
                canceller.cancel();
                continue;
            }
        };

        match event {
            Some(JobEvent::Progress(progress)) => {
                print!(
                    "\r  [{:<10}] {:>5.1}%  ",
                    progress.stage.as_str(),
                    progress.percent
                );
                std::io::stdout().flush().ok();
            }
            Some(JobEvent::Completed(path)) => {
                println!("\nDone: {}", path.display());
                return Ok(());
            }
            Some(JobEvent::Failed { kind, message }) => {
                println!();
                anyhow::bail!("job failed ({}): {message}", kind.as_str());
            }
            Some(JobEvent::Cancelled) => {
                println!("\nCancelled; no file was written.");
                return Ok(());
            }
            None => anyhow::bail!("job ended without a terminal event"),
        }
    }
}
