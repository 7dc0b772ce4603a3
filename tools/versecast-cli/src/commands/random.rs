//! Generate videos from random verse selections.

use std::path::PathBuf;

use versecast_common::config::AppConfig;
use versecast_compose_engine::Composer;
use versecast_verse_model::{CompositionJob, Language, Reciter};

pub async fn run(
    config: AppConfig,
    count: usize,
    reciter: Option<String>,
    language: Option<String>,
    output: Option<PathBuf>,
    theme: Option<String>,
) -> anyhow::Result<()> {
    let reciter: Option<Reciter> = reciter.map(|r| r.parse()).transpose()?;
    let translation: Option<Language> = language.map(|l| l.parse()).transpose()?;
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let target_secs = config.composition.target_duration_secs;

    let composer = Composer::from_config(config)?;

    for i in 0..count.max(1) {
        let mut rng = rand::thread_rng();
        let mut job = CompositionJob::random(
            &mut rng,
            reciter,
            translation,
            output_dir.clone(),
            target_secs,
        );
        job.background_theme = theme.clone();

        let (first, last) = job.verse_span();
        println!(
            "[{}/{}] Surah {} ({}), ayahs {}-{}, reciter {}",
            i + 1,
            count.max(1),
            first.surah,
            first.surah_name(),
            first.ayah,
            last.ayah,
            job.reciter
        );

        let handle = composer.spawn(job);
        super::generate::watch(handle).await?;
    }

    Ok(())
}
