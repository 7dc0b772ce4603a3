//! List the reciter and translation language catalogs.

use versecast_verse_model::{Language, Reciter};

pub fn run() -> anyhow::Result<()> {
    println!("Reciters:");
    for reciter in Reciter::all() {
        println!(
            "  {:<14} {:<24} ({})",
            reciter.short_name(),
            reciter.display_name(),
            reciter.id()
        );
    }

    println!();
    println!("Translation languages (Arabic is always included):");
    for language in Language::all() {
        println!(
            "  {:<4} {:<12} ({})",
            language.code(),
            language.display_name(),
            language.edition()
        );
    }

    Ok(())
}
