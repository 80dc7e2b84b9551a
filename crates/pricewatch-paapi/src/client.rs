//! HTTP client for the partner product API.
//!
//! Wraps `reqwest` with the API's JSON-over-POST conventions, credential
//! headers, typed response deserialization, and bounded retry on throttling.
//! The client never touches the store; it only performs the outbound call.

use std::time::Duration;

use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use pricewatch_core::{AppConfig, PaapiCredentials, RawProductFields};

use crate::error::PaapiError;
use crate::retry::retry_with_backoff;
use crate::types::{GetItemsRequest, GetItemsResponse, SearchItemsRequest, SearchItemsResponse, ITEM_RESOURCES};

const DEFAULT_BASE_URL: &str = "https://webservices.amazon.it/paapi5";

/// Cap on the response body kept for `UnexpectedStatus` diagnostics.
const MAX_ERROR_BODY: usize = 256;

/// Client for the partner product API.
///
/// Use [`PaapiClient::from_config`] for production or
/// [`PaapiClient::with_base_url`] to point at a mock server in tests.
pub struct PaapiClient {
    client: Client,
    credentials: PaapiCredentials,
    marketplace: String,
    base_url: Url,
    max_retries: u32,
    retry_base_secs: u64,
}

impl PaapiClient {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PaapiError::MissingCredentials`] when the credential triple
    /// is absent; the caller surfaces this once at startup, never per call.
    /// Returns [`PaapiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, PaapiError> {
        let credentials = config
            .paapi_credentials
            .clone()
            .ok_or(PaapiError::MissingCredentials)?;
        let base_url = config.paapi_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Self::with_base_url(
            credentials,
            &config.marketplace,
            config.request_timeout_secs,
            config.max_retries,
            config.retry_base_secs,
            base_url,
        )
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PaapiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`PaapiError::InvalidBaseUrl`] if `base_url`
    /// does not parse.
    pub fn with_base_url(
        credentials: PaapiCredentials,
        marketplace: &str,
        timeout_secs: u64,
        max_retries: u32,
        retry_base_secs: u64,
        base_url: &str,
    ) -> Result<Self, PaapiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pricewatch/0.1 (price-tracking)")
            .build()?;

        // Normalise: exactly one trailing slash so join() appends the
        // operation segment instead of replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PaapiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            credentials,
            marketplace: marketplace.to_owned(),
            base_url,
            max_retries,
            retry_base_secs,
        })
    }

    /// Fetches one product by identifier.
    ///
    /// Retries throttling responses with exponential backoff up to the
    /// configured budget.
    ///
    /// # Errors
    ///
    /// - [`PaapiError::NotFound`] when the catalog has no item for `asin`.
    /// - [`PaapiError::RateLimited`] after the full retry budget is spent.
    /// - [`PaapiError::UnexpectedStatus`] on any other non-2xx response
    ///   (not retried).
    /// - [`PaapiError::Http`] / [`PaapiError::Deserialize`] on transport or
    ///   decoding failure.
    pub async fn get_item(&self, asin: &str) -> Result<RawProductFields, PaapiError> {
        let request = GetItemsRequest {
            item_ids: vec![asin],
            partner_tag: &self.credentials.partner_tag,
            marketplace: &self.marketplace,
            resources: ITEM_RESOURCES,
        };

        let response: GetItemsResponse =
            retry_with_backoff(self.max_retries, self.retry_base_secs, || {
                self.post_json("getitems", &request)
            })
            .await?;

        response
            .items_result
            .items
            .into_iter()
            .next()
            .map(crate::types::Item::into_raw_fields)
            .ok_or_else(|| PaapiError::NotFound {
                asin: asin.to_owned(),
            })
    }

    /// Searches the catalog by keyword, returning at most `item_count`
    /// candidates. Same retry policy as [`PaapiClient::get_item`].
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`PaapiClient::get_item`], except an empty result is
    /// an empty list rather than `NotFound`.
    pub async fn search_items(
        &self,
        keywords: &str,
        item_count: usize,
    ) -> Result<Vec<RawProductFields>, PaapiError> {
        let request = SearchItemsRequest {
            keywords,
            item_count,
            partner_tag: &self.credentials.partner_tag,
            marketplace: &self.marketplace,
        };

        let response: SearchItemsResponse =
            retry_with_backoff(self.max_retries, self.retry_base_secs, || {
                self.post_json("searchitems", &request)
            })
            .await?;

        Ok(response
            .search_result
            .items
            .into_iter()
            .take(item_count)
            .map(crate::types::Item::into_raw_fields)
            .collect())
    }

    /// Looks up the referral URL for a single identifier.
    ///
    /// The partner API embeds the partner tag in the item's detail-page URL,
    /// so a plain single-item lookup is the whole resolution.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`PaapiClient::get_item`].
    pub async fn affiliate_link(&self, asin: &str) -> Result<Option<String>, PaapiError> {
        let fields = self.get_item(asin).await?;
        Ok(fields.affiliate_link)
    }

    /// Sends one POST, maps throttling and error statuses, and decodes the
    /// 2xx body as `T`.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        op: &str,
        body: &B,
    ) -> Result<T, PaapiError> {
        let url = self
            .base_url
            .join(op)
            .map_err(|e| PaapiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .post(url.clone())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.credentials.access_key),
            )
            .header("x-secret-key", &self.credentials.secret_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(PaapiError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(MAX_ERROR_BODY);
            return Err(PaapiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PaapiError::Deserialize {
            context: format!("{op} response"),
            source: e,
        })
    }
}
