//! Check toolchain availability and configuration.

use versecast_common::config::AppConfig;
use versecast_compose_engine::background::list_clips;
use versecast_content_client::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Versecast System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = command_exists("ffmpeg");
    let ffprobe = command_exists("ffprobe");
    println!(
        "[{}] ffmpeg in PATH",
        if ffmpeg { "OK" } else { "FAIL" }
    );
    println!(
        "[{}] ffprobe in PATH",
        if ffprobe { "OK" } else { "FAIL" }
    );

    println!();
    println!("Configuration:");
    println!("  Output directory:      {}", config.output_dir.display());
    println!("  Backgrounds directory: {}", config.backgrounds_dir.display());
    println!("  Cache directory:       {}", config.cache.dir.display());
    println!(
        "  Cache budget:          {:.0} MiB",
        config.cache.max_bytes as f64 / (1024.0 * 1024.0)
    );
    println!("  Provider base URL:     {}", config.fetch.base_url);
    println!(
        "  Output format:         {}x{} @ {} fps, H.264/AAC",
        config.composition.width, config.composition.height, config.composition.fps
    );

    let clips = list_clips(&config.backgrounds_dir);
    if clips.is_empty() {
        println!();
        println!(
            "[WARN] No background clips in {}; a solid color will be used",
            config.backgrounds_dir.display()
        );
    } else {
        println!();
        println!("[OK] {} background clip(s) available", clips.len());
    }

    if !ffmpeg || !ffprobe {
        anyhow::bail!("media toolchain incomplete: install ffmpeg (with ffprobe)");
    }
    Ok(())
}
