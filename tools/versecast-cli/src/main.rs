//! Versecast CLI — Command-line interface for verse video generation.
//!
//! Usage:
//!   versecast generate [OPTIONS]   Generate a video for a verse range
//!   versecast random [OPTIONS]     Generate videos from random selections
//!   versecast cache <ACTION>       Inspect or clear the asset cache
//!   versecast catalog              List reciters and translation languages
//!   versecast check                Check toolchain and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use versecast_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "versecast",
    about = "Quran verse videos with synchronized subtitles, from the command line",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video for an explicit verse range
    Generate {
        /// Surah number (1-114)
        #[arg(short, long)]
        surah: u16,

        /// First ayah of the range
        #[arg(long, default_value = "1")]
        from: u16,

        /// Last ayah of the range (defaults to the first)
        #[arg(long)]
        to: Option<u16>,

        /// Reciter (short name or provider id)
        #[arg(short, long, default_value = "Alafasy")]
        reciter: String,

        /// Translation language (ISO code or English name)
        #[arg(short, long)]
        language: Option<String>,

        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output filename override
        #[arg(long)]
        filename: Option<String>,

        /// Background theme filter (filename substring)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Generate videos from random verse selections
    Random {
        /// Number of videos to generate
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Reciter (random when omitted)
        #[arg(short, long)]
        reciter: Option<String>,

        /// Translation language (ISO code or English name)
        #[arg(short, long)]
        language: Option<String>,

        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Background theme filter (filename substring)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Inspect or clear the asset cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// List reciters and translation languages
    Catalog,

    /// Check toolchain and configuration
    Check,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count and storage usage
    Stats,
    /// Remove all unpinned entries
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    versecast_common::logging::init_logging(&versecast_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    let config = AppConfig::load();

    match cli.command {
        Commands::Generate {
            surah,
            from,
            to,
            reciter,
            language,
            output,
            filename,
            theme,
        } => {
            commands::generate::run(config, surah, from, to, reciter, language, output, filename, theme)
                .await
        }
        Commands::Random {
            count,
            reciter,
            language,
            output,
            theme,
        } => commands::random::run(config, count, reciter, language, output, theme).await,
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::stats(&config),
            CacheAction::Clear => commands::cache::clear(&config),
        },
        Commands::Catalog => commands::catalog::run(),
        Commands::Check => commands::check::run(&config),
    }
}
