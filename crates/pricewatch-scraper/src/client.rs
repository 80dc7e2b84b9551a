//! HTTP scraper for product detail and search-results pages.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode, Url};

use pricewatch_core::{AppConfig, RawProductFields};

use crate::block::is_block_page;
use crate::error::ScrapeError;
use crate::parse::{parse_product_page, parse_search_page};

/// Desktop user agents rotated per request. Keeping the pool small and
/// current-looking matters more than keeping it large.
pub(crate) const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

/// Scraper for public product pages.
///
/// Each fetch waits a random delay inside the configured window, then sends
/// one GET with a rotated user agent and browser-like headers. Responses are
/// gated on known block markers before any parsing happens: a blocked fetch
/// returns [`ScrapeError::Blocked`] and never partial fields.
pub struct PageScraper {
    client: Client,
    base_url: Url,
    locale: String,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl PageScraper {
    /// Creates a scraper targeting `https://{marketplace}` from app config.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidUrl`] if the marketplace host does not
    /// form a valid URL, or [`ScrapeError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScrapeError> {
        Self::with_base_url(
            &format!("https://{}", config.marketplace),
            &config.locale,
            config.request_timeout_secs,
            config.min_delay_ms,
            config.max_delay_ms,
        )
    }

    /// Creates a scraper against an explicit base URL. Tests use this to
    /// point at a local mock server; production goes through
    /// [`PageScraper::from_config`].
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidUrl`] if `base_url` cannot be parsed, or
    /// [`ScrapeError::Http`] if the client cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        locale: &str,
        timeout_secs: u64,
        min_delay_ms: u64,
        max_delay_ms: u64,
    ) -> Result<Self, ScrapeError> {
        // Normalize so Url::join treats the base as a directory.
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| ScrapeError::InvalidUrl {
            url: normalized.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            base_url,
            locale: locale.to_owned(),
            min_delay_ms,
            max_delay_ms: max_delay_ms.max(min_delay_ms),
        })
    }

    /// Fetches and parses the detail page for one product identifier.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::NotFound`]: HTTP 404.
    /// - [`ScrapeError::Blocked`]: the body matched a block marker.
    /// - [`ScrapeError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ScrapeError::Http`]: network or timeout failure.
    pub async fn fetch_product(&self, asin: &str) -> Result<RawProductFields, ScrapeError> {
        let url = self.join(&format!("dp/{asin}"))?;
        let body = self.fetch_page(url).await?;
        Ok(parse_product_page(&body, asin))
    }

    /// Fetches one search-results page and parses up to `limit` candidates.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`PageScraper::fetch_product`].
    pub async fn search_category(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<RawProductFields>, ScrapeError> {
        let mut url = self.join("s")?;
        url.query_pairs_mut().append_pair("k", keyword);
        let body = self.fetch_page(url).await?;
        Ok(parse_search_page(&body, keyword, limit))
    }

    async fn fetch_page(&self, url: Url) -> Result<String, ScrapeError> {
        self.jitter_delay().await;

        let user_agent = pick_user_agent();
        tracing::debug!(url = %url, user_agent, "fetching page");

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, self.accept_language())
            .header(reqwest::header::REFERER, self.base_url.as_str())
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        let url = url.to_string();

        if status == StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound { url });
        }
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        if is_block_page(&body) {
            tracing::warn!(url = %url, "block page detected");
            return Err(ScrapeError::Blocked { url });
        }

        Ok(body)
    }

    /// Sleeps a random duration inside `[min_delay_ms, max_delay_ms]`.
    /// A zero window (both bounds zero) skips the sleep so tests run fast.
    async fn jitter_delay(&self) {
        if self.max_delay_ms == 0 {
            return;
        }
        let delay = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    /// `Accept-Language` derived from the configured locale, e.g.
    /// `it-IT` becomes `it-IT,it;q=0.9,en;q=0.7`.
    fn accept_language(&self) -> String {
        let lang = self.locale.split('-').next().unwrap_or(&self.locale);
        format!("{},{lang};q=0.9,en;q=0.7", self.locale)
    }

    fn join(&self, path: &str) -> Result<Url, ScrapeError> {
        self.base_url.join(path).map_err(|e| ScrapeError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS[rand::rng().random_range(0..USER_AGENTS.len())]
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
