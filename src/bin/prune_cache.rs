#![forbid(unsafe_code)]

//! Maintenance helper for the SQLite snapshot cache. The server only expires
//! snapshots lazily on read, so stale rows accumulate for channels nobody
//! asks about anymore; run this from a timer to drop them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use tubefeed::config::{DEFAULT_CACHE_DB_PATH, DEFAULT_CONFIG_PATH, read_env_config};
use tubefeed::snapshot_store::SqliteSnapshots;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prune expired channel snapshots from the tubefeed cache.")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH, help = "Path to the config file")]
    config: PathBuf,
    #[arg(long = "db", value_name = "PATH", help = "Cache DB to prune (default: CACHE_DB_PATH)")]
    db: Option<PathBuf>,
    #[arg(
        long = "max-age-secs",
        value_name = "SECS",
        help = "Delete snapshots older than this (default: CACHE_FRESHNESS_SECS)"
    )]
    max_age_secs: Option<u64>,
    #[arg(long = "stats", help = "Only print per-channel snapshot counts")]
    stats: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = read_env_config(&cli.config)?.unwrap_or_default();

    let db_path = cli
        .db
        .or(env.cache_db_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DB_PATH));
    let store = SqliteSnapshots::open(&db_path)?;
    println!("Cache DB: {}", db_path.display());

    if cli.stats {
        print_stats(&store)?;
        return Ok(());
    }

    let max_age_secs = cli
        .max_age_secs
        .or(env.cache_freshness_secs)
        .unwrap_or(tubefeed::cache::DEFAULT_FRESHNESS.as_secs());
    let max_age = TimeDelta::try_seconds(i64::try_from(max_age_secs)?)
        .context("max age out of range")?;
    let cutoff = Utc::now() - max_age;

    let removed = store
        .prune_older_than(cutoff)
        .context("pruning snapshots")?;
    println!("Removed {} snapshot(s) fetched before {}", removed, cutoff.to_rfc3339());
    print_stats(&store)
}

fn print_stats(store: &SqliteSnapshots) -> Result<()> {
    let stats = store.stats().context("reading snapshot stats")?;
    if stats.is_empty() {
        println!("No snapshots stored.");
        return Ok(());
    }

    let total: u64 = stats.iter().map(|channel| channel.entries).sum();
    println!("{} snapshot(s) across {} channel(s):", total, stats.len());
    for channel in &stats {
        let newest = channel
            .newest
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("  - {} ({} entries, newest {})", channel.channel_id, channel.entries, newest);
    }
    Ok(())
}
