//! Browser-driven scraper for pages the plain HTTP client cannot get past.
//!
//! Compiled in behind the `browser` feature (on by default). Without the
//! feature a stub with the same signatures is built so callers never need
//! their own conditional compilation.

#[cfg(not(feature = "browser"))]
use pricewatch_core::{AppConfig, RawProductFields};

#[cfg(not(feature = "browser"))]
use crate::error::ScrapeError;

#[cfg(feature = "browser")]
mod real {
    use std::time::Duration;

    use chromiumoxide::{Browser, BrowserConfig};
    use futures::StreamExt;
    use reqwest::Url;
    use tokio::task::JoinHandle;

    use pricewatch_core::{AppConfig, RawProductFields};

    use crate::block::is_block_page;
    use crate::error::ScrapeError;
    use crate::parse::parse_product_page;

    const CONSENT_BUTTON: &str = "#sp-cc-accept";
    const SCROLL_STEPS: u32 = 3;
    const SCROLL_PAUSE_MS: u64 = 400;

    /// Headless Chromium session scoped to one marketplace.
    ///
    /// Each fetch opens a fresh tab, accepts the cookie-consent banner if
    /// present, scrolls in bounded steps so lazy-loaded content renders, and
    /// hands the final DOM to the same parser the HTTP scraper uses.
    pub struct BrowserScraper {
        browser: Browser,
        handler: JoinHandle<()>,
        base_url: Url,
    }

    impl BrowserScraper {
        /// Launches a headless browser targeting `https://{marketplace}`.
        ///
        /// # Errors
        ///
        /// Returns [`ScrapeError::Browser`] if Chromium cannot be launched,
        /// or [`ScrapeError::InvalidUrl`] if the marketplace host does not
        /// form a valid URL.
        pub async fn launch(config: &AppConfig) -> Result<Self, ScrapeError> {
            let base = format!("https://{}/", config.marketplace);
            let base_url = Url::parse(&base).map_err(|e| ScrapeError::InvalidUrl {
                url: base.clone(),
                reason: e.to_string(),
            })?;

            let browser_config = BrowserConfig::builder()
                .request_timeout(Duration::from_secs(config.request_timeout_secs))
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-infobars")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--disable-background-networking")
                .arg("--no-sandbox")
                .arg("--disable-gpu")
                .arg(format!("--lang={}", config.locale))
                .build()
                .map_err(|details| ScrapeError::Browser { details })?;

            let (browser, mut handler) = Browser::launch(browser_config)
                .await
                .map_err(|e| ScrapeError::Browser {
                    details: e.to_string(),
                })?;

            // The handler drives the CDP connection until the browser closes.
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(marketplace = %config.marketplace, "headless browser launched");

            Ok(Self {
                browser,
                handler,
                base_url,
            })
        }

        /// Renders and parses the detail page for one product identifier.
        ///
        /// # Errors
        ///
        /// - [`ScrapeError::Blocked`]: the rendered DOM matched a block marker.
        /// - [`ScrapeError::Browser`]: navigation or CDP failure.
        pub async fn fetch_product(&self, asin: &str) -> Result<RawProductFields, ScrapeError> {
            let url = self
                .base_url
                .join(&format!("dp/{asin}"))
                .map_err(|e| ScrapeError::InvalidUrl {
                    url: format!("{}dp/{asin}", self.base_url),
                    reason: e.to_string(),
                })?;

            tracing::debug!(url = %url, "rendering page in browser");
            let page = self
                .browser
                .new_page(url.as_str())
                .await
                .map_err(browser_err)?;

            // Consent banner is not always present; a missing button is fine.
            if let Ok(button) = page.find_element(CONSENT_BUTTON).await {
                if button.click().await.is_ok() {
                    tracing::debug!("accepted cookie consent banner");
                }
            }

            for step in 1..=SCROLL_STEPS {
                let script = format!(
                    "window.scrollTo(0, document.body.scrollHeight * {step} / {SCROLL_STEPS})"
                );
                page.evaluate(script).await.map_err(browser_err)?;
                tokio::time::sleep(Duration::from_millis(SCROLL_PAUSE_MS)).await;
            }

            let body = page.content().await.map_err(browser_err)?;
            let _ = page.close().await;

            if is_block_page(&body) {
                tracing::warn!(url = %url, "block page detected in browser session");
                return Err(ScrapeError::Blocked {
                    url: url.to_string(),
                });
            }

            Ok(parse_product_page(&body, asin))
        }

        /// Shuts down the browser process and its CDP handler.
        pub async fn close(mut self) {
            if let Err(e) = self.browser.close().await {
                tracing::warn!(error = %e, "browser did not close cleanly");
            }
            self.handler.abort();
        }
    }

    fn browser_err(e: chromiumoxide::error::CdpError) -> ScrapeError {
        ScrapeError::Browser {
            details: e.to_string(),
        }
    }
}

#[cfg(feature = "browser")]
pub use real::BrowserScraper;

/// Stub built when the `browser` feature is off. Same surface, always fails
/// with [`ScrapeError::BrowserUnavailable`].
#[cfg(not(feature = "browser"))]
pub struct BrowserScraper {
    _private: (),
}

#[cfg(not(feature = "browser"))]
impl BrowserScraper {
    /// Always fails: browser support is not compiled in.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::BrowserUnavailable`].
    pub async fn launch(_config: &AppConfig) -> Result<Self, ScrapeError> {
        Err(ScrapeError::BrowserUnavailable)
    }

    /// Always fails: browser support is not compiled in.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::BrowserUnavailable`].
    pub async fn fetch_product(&self, _asin: &str) -> Result<RawProductFields, ScrapeError> {
        Err(ScrapeError::BrowserUnavailable)
    }

    pub async fn close(self) {}
}
