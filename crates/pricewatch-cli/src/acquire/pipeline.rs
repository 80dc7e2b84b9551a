//! Per-identifier acquisition pipeline: source fallback, normalization,
//! persistence, and backfill scheduling.

use std::sync::Arc;

use anyhow::Context;

use pricewatch_core::normalize::normalize_fields;
use pricewatch_core::{AppConfig, ProductFields, RawProductFields};
use pricewatch_db::{upsert_product, ProductRow};
use pricewatch_paapi::PaapiClient;
use pricewatch_scraper::{BrowserScraper, PageScraper};

use super::backfill::BackfillTracker;

/// Outcome of acquiring one identifier.
#[derive(Debug)]
pub(super) enum Outcome {
    /// Record persisted with a referral link already present.
    Persisted(ProductRow),
    /// Record persisted; referral link absent, backfill scheduled.
    PartialBackfill(ProductRow),
    /// No source produced a usable result.
    NotFound,
}

/// The acquisition sources in priority order. `api` is absent when the
/// credential triple is not configured; `browser` is absent when launching
/// fails or the feature is compiled out. Both absences degrade the fallback
/// chain rather than failing the run.
pub(super) struct Sources {
    pub api: Option<Arc<PaapiClient>>,
    pub page: PageScraper,
    pub browser: Option<BrowserScraper>,
}

impl Sources {
    pub(super) async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let api = if config.paapi_credentials.is_some() {
            let client = PaapiClient::from_config(config).context("building API client")?;
            Some(Arc::new(client))
        } else {
            tracing::info!("partner API credentials not configured; API source disabled");
            None
        };

        let page = PageScraper::from_config(config).context("building page scraper")?;

        let browser = match BrowserScraper::launch(config).await {
            Ok(browser) => Some(browser),
            Err(e) => {
                tracing::warn!(error = %e, "browser source unavailable");
                None
            }
        };

        Ok(Self { api, page, browser })
    }

    pub(super) async fn shutdown(self) {
        if let Some(browser) = self.browser {
            browser.close().await;
        }
    }
}

/// Acquires one identifier through the source fallback chain.
///
/// An existing record short-circuits acquisition entirely; only its missing
/// referral link is backfilled. Otherwise sources are tried strictly in
/// priority order, and the first one whose result survives normalization
/// wins. Source failures are soft: logged, then on to the next source.
///
/// # Errors
///
/// Returns an error only for persistence failures; source failures resolve to
/// [`Outcome::NotFound`].
pub(super) async fn acquire_one(
    pool: &sqlx::PgPool,
    sources: &Sources,
    tracker: &BackfillTracker,
    asin: &str,
) -> anyhow::Result<Outcome> {
    if let Some(record) = pricewatch_db::get_product(pool, asin)
        .await
        .context("checking for existing record")?
    {
        tracing::debug!(asin, "record already stored; skipping acquisition");
        if record.affiliate_link.is_some() {
            return Ok(Outcome::Persisted(record));
        }
        schedule_backfill(pool, sources, tracker, asin).await;
        return Ok(Outcome::PartialBackfill(record));
    }

    let Some(fields) = fetch_usable_fields(sources, asin).await else {
        return Ok(Outcome::NotFound);
    };
    persist_candidate(pool, sources, tracker, &fields).await
}

/// Keyword acquisition: search via the API when available, the page scraper
/// otherwise, then persist each candidate independently.
pub(super) async fn acquire_by_category(
    pool: &sqlx::PgPool,
    sources: &Sources,
    tracker: &BackfillTracker,
    config: &AppConfig,
    keyword: &str,
) -> Vec<(String, anyhow::Result<Outcome>)> {
    let candidates = search_candidates(sources, config, keyword).await;
    if candidates.is_empty() {
        tracing::warn!(keyword, "no search candidates found");
        return Vec::new();
    }

    let mut outcomes = Vec::with_capacity(candidates.len());
    for raw in candidates {
        let asin = raw.asin.clone().unwrap_or_default();
        let outcome = match normalize_fields(&raw) {
            Some(fields) => persist_candidate(pool, sources, tracker, &fields).await,
            None => {
                tracing::debug!(asin, "candidate unusable after normalization");
                Ok(Outcome::NotFound)
            }
        };
        outcomes.push((asin, outcome));
    }
    outcomes
}

async fn search_candidates(
    sources: &Sources,
    config: &AppConfig,
    keyword: &str,
) -> Vec<RawProductFields> {
    if let Some(api) = &sources.api {
        match api.search_items(keyword, config.search_limit).await {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => tracing::warn!(keyword, "API search returned no items; falling back"),
            Err(e) => tracing::warn!(keyword, error = %e, "API search failed; falling back"),
        }
    }

    match sources.page.search_category(keyword, config.search_limit).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(keyword, error = %e, "search scrape failed");
            Vec::new()
        }
    }
}

/// Runs the fallback chain for one identifier and returns the first result
/// that survives normalization. When the API result and a scrape result would
/// disagree, the API wins by construction: scrapers are only consulted after
/// the API path has failed for its full retry budget.
async fn fetch_usable_fields(sources: &Sources, asin: &str) -> Option<ProductFields> {
    if let Some(api) = &sources.api {
        match api.get_item(asin).await {
            Ok(raw) => match normalize_fields(&raw) {
                Some(fields) => return Some(fields),
                None => tracing::warn!(asin, "API result unusable after normalization"),
            },
            Err(e) => tracing::warn!(asin, error = %e, "API source failed; falling back"),
        }
    }

    match sources.page.fetch_product(asin).await {
        Ok(raw) => match normalize_fields(&raw) {
            Some(fields) => return Some(fields),
            None => tracing::warn!(asin, "scraped page unusable after normalization"),
        },
        Err(e) => tracing::warn!(asin, error = %e, "page source failed; falling back"),
    }

    if let Some(browser) = &sources.browser {
        match browser.fetch_product(asin).await {
            Ok(raw) => match normalize_fields(&raw) {
                Some(fields) => return Some(fields),
                None => tracing::warn!(asin, "browser page unusable after normalization"),
            },
            Err(e) => tracing::warn!(asin, error = %e, "browser source failed"),
        }
    }

    tracing::info!(asin, "no source produced a usable result");
    None
}

async fn persist_candidate(
    pool: &sqlx::PgPool,
    sources: &Sources,
    tracker: &BackfillTracker,
    fields: &ProductFields,
) -> anyhow::Result<Outcome> {
    let result = upsert_product(pool, fields)
        .await
        .with_context(|| format!("persisting {}", fields.asin))?;

    if result.referral_link_present {
        return Ok(Outcome::Persisted(result.record));
    }
    schedule_backfill(pool, sources, tracker, &fields.asin).await;
    Ok(Outcome::PartialBackfill(result.record))
}

async fn schedule_backfill(
    pool: &sqlx::PgPool,
    sources: &Sources,
    tracker: &BackfillTracker,
    asin: &str,
) {
    if let Some(api) = &sources.api {
        tracker
            .schedule(pool.clone(), Arc::clone(api), asin.to_owned())
            .await;
    } else {
        tracing::debug!(asin, "no API client; referral link left absent");
    }
}
