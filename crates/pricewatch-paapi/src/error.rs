use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaapiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("partner API credentials are not configured")]
    MissingCredentials,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Terminal throttling failure: either a single 429 when retries are
    /// disabled, or the last 429 after the whole retry budget was spent.
    #[error("rate limited by partner api (retry-after: {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("item {asin} not found in partner catalog")]
    NotFound { asin: String },

    #[error("unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        /// Response body truncated for diagnostics.
        body: String,
    },
}
