use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The fetched page matched a known block marker. Never carries
    /// partially-parsed data.
    #[error("blocked by upstream at {url}")]
    Blocked { url: String },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("browser support not compiled in; rebuild with the `browser` feature")]
    BrowserUnavailable,

    #[error("browser session failed: {details}")]
    Browser { details: String },
}
