//! Batch runner: bounded-parallel acquisition over a set of identifiers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use pricewatch_core::AppConfig;
use pricewatch_db::ProductRow;

use super::backfill::BackfillTracker;
use super::pipeline::{self, Outcome, Sources};

/// Aggregated batch totals for the summary line.
#[derive(Debug, Default)]
pub(super) struct BatchTotals {
    pub persisted: usize,
    pub partial: usize,
    pub not_found: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Processes the identifiers with at most `max_concurrent` acquisitions in
/// flight. The cancellation flag is checked as each identifier starts, so an
/// interrupt stops new work while in-flight acquisitions complete.
pub(super) async fn run_batch(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    sources: &Sources,
    tracker: &BackfillTracker,
    identifiers: Vec<String>,
    cancel: &Arc<AtomicBool>,
) -> BatchTotals {
    let max_concurrent = config.max_concurrent.max(1);

    let results: Vec<(String, Option<anyhow::Result<Outcome>>)> = stream::iter(identifiers)
        .map(|asin| {
            let cancel = Arc::clone(cancel);
            async move {
                if cancel.load(Ordering::Relaxed) {
                    return (asin, None);
                }
                let outcome = pipeline::acquire_one(pool, sources, tracker, &asin).await;
                (asin, Some(outcome))
            }
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let mut totals = BatchTotals::default();
    for (asin, result) in results {
        match result {
            Some(Ok(Outcome::Persisted(record))) => {
                println!("{asin}: persisted{}", price_note(&record));
                totals.persisted += 1;
            }
            Some(Ok(Outcome::PartialBackfill(record))) => {
                println!(
                    "{asin}: persisted{} (affiliate link backfill scheduled)",
                    price_note(&record)
                );
                totals.partial += 1;
            }
            Some(Ok(Outcome::NotFound)) => {
                println!("{asin}: not found");
                totals.not_found += 1;
            }
            Some(Err(e)) => {
                tracing::error!(asin, error = %format!("{e:#}"), "acquisition failed");
                println!("{asin}: failed");
                totals.failed += 1;
            }
            None => {
                println!("{asin}: skipped (cancelled)");
                totals.skipped += 1;
            }
        }
    }
    totals
}

fn price_note(record: &ProductRow) -> String {
    record
        .price
        .map(|price| format!(" at {price}"))
        .unwrap_or_default()
}
