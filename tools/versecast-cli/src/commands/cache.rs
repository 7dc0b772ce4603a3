//! Inspect or clear the asset cache.

use versecast_asset_cache::AssetCache;
use versecast_common::config::AppConfig;

pub fn stats(config: &AppConfig) -> anyhow::Result<()> {
    let cache = AssetCache::open_fs(&config.cache.dir, config.cache.max_bytes)?;

    println!("Asset cache at {}", config.cache.dir.display());
    println!("  Entries: {}", cache.entry_count());
    println!(
        "  Usage:   {} / {}",
        format_bytes(cache.usage_bytes()),
        format_bytes(config.cache.max_bytes)
    );
    Ok(())
}

pub fn clear(config: &AppConfig) -> anyhow::Result<()> {
    let cache = AssetCache::open_fs(&config.cache.dir, config.cache.max_bytes)?;
    let before = cache.entry_count();
    cache.clear()?;
    println!(
        "Cleared {} cache entries from {}",
        before,
        config.cache.dir.display()
    );
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    format!("{:.1} MiB", bytes as f64 / MIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_in_mebibytes() {
        assert_eq!(format_bytes(0), "0.0 MiB");
        assert_eq!(format_bytes(512 * 1024 * 1024), "512.0 MiB");
    }
}
