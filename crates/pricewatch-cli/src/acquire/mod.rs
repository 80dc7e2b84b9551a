//! Acquisition command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-identifier failures are logged and counted rather than
//! propagated so a single bad identifier does not abort the full run.

mod backfill;
mod pipeline;
mod runner;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use pricewatch_core::AppConfig;

use backfill::BackfillTracker;
use pipeline::{Outcome, Sources};

#[derive(Debug, Args)]
pub struct AcquireArgs {
    /// Product identifier; repeat for a batch
    #[arg(long = "asin", value_name = "ASIN")]
    pub asins: Vec<String>,

    /// File with one identifier per line
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Batch acquisition over a set of identifiers.
///
/// Identifiers come from repeated `--asin` flags, a `--file`, or both. The
/// batch runs with bounded parallelism; Ctrl-C stops the run between
/// identifiers while letting in-flight acquisitions complete.
///
/// # Errors
///
/// Returns an error if no identifiers were given, the sources cannot be
/// constructed, or every identifier in the batch hard-failed.
pub(crate) async fn run_acquire(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: AcquireArgs,
) -> anyhow::Result<()> {
    let identifiers = collect_identifiers(args)?;
    if identifiers.is_empty() {
        anyhow::bail!("no identifiers given; pass --asin or --file");
    }

    let sources = Sources::from_config(config).await?;
    let tracker = BackfillTracker::new();
    let cancel = cancel_on_ctrl_c();

    let totals = runner::run_batch(pool, config, &sources, &tracker, identifiers, &cancel).await;

    tracker.wait().await;
    sources.shutdown().await;

    println!(
        "persisted {} ({} awaiting link backfill), not found {}, failed {}, skipped {}",
        totals.persisted + totals.partial,
        totals.partial,
        totals.not_found,
        totals.failed,
        totals.skipped
    );

    if totals.failed > 0 && totals.persisted + totals.partial + totals.not_found == 0 {
        anyhow::bail!("all {} identifiers failed", totals.failed);
    }
    Ok(())
}

/// Keyword acquisition: one search, then each candidate persisted
/// independently.
///
/// # Errors
///
/// Returns an error if the sources cannot be constructed. Per-candidate
/// persistence failures are logged and counted, not propagated.
pub(crate) async fn run_acquire_category(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    keyword: &str,
) -> anyhow::Result<()> {
    let sources = Sources::from_config(config).await?;
    let tracker = BackfillTracker::new();

    let outcomes = pipeline::acquire_by_category(pool, &sources, &tracker, config, keyword).await;

    tracker.wait().await;
    sources.shutdown().await;

    let mut persisted = 0_usize;
    let mut not_found = 0_usize;
    let mut failed = 0_usize;
    for (asin, outcome) in outcomes {
        match outcome {
            Ok(Outcome::Persisted(_) | Outcome::PartialBackfill(_)) => {
                println!("{asin}: persisted");
                persisted += 1;
            }
            Ok(Outcome::NotFound) => {
                println!("{asin}: not usable");
                not_found += 1;
            }
            Err(e) => {
                tracing::error!(asin, error = %format!("{e:#}"), "candidate failed");
                println!("{asin}: failed");
                failed += 1;
            }
        }
    }
    println!("candidates for \"{keyword}\": persisted {persisted}, unusable {not_found}, failed {failed}");
    Ok(())
}

fn collect_identifiers(args: AcquireArgs) -> anyhow::Result<Vec<String>> {
    let mut identifiers = args.asins;
    if let Some(path) = args.file {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading identifier file {}", path.display()))?;
        identifiers.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned),
        );
    }
    let mut seen = std::collections::HashSet::new();
    identifiers.retain(|id| seen.insert(id.clone()));
    Ok(identifiers)
}

/// Spawns a Ctrl-C listener that flips the cancellation flag. The flag is
/// checked between identifiers; an acquisition already in flight completes.
fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing in-flight acquisitions");
            flag.store(true, Ordering::Relaxed);
        }
    });
    cancel
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "acquire_test.rs"]
mod tests;
