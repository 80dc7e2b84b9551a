//! Page scraping for the price-tracking pipeline.
//!
//! Two acquisition paths share one parser: [`PageScraper`] fetches pages over
//! plain HTTP with rotated browser identities, and [`BrowserScraper`] renders
//! them in headless Chromium when the HTTP path gets blocked. Both gate on
//! [`block::is_block_page`] before parsing so a blocked fetch never yields
//! partial fields.

pub mod block;
pub mod browser;
pub mod client;
pub mod error;
pub mod parse;

pub use block::{is_block_page, BLOCK_MARKERS};
pub use browser::BrowserScraper;
pub use client::PageScraper;
pub use error::ScrapeError;
pub use parse::{parse_product_page, parse_search_page, MAX_SEARCH_RESULTS};
