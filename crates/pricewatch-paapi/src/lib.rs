//! Rate-limited partner-API client: single-item lookup, keyword search, and
//! affiliate-link resolution, with bounded exponential backoff on throttling.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::PaapiClient;
pub use error::PaapiError;
pub use retry::backoff_delay_secs;
pub use types::{GetItemsResponse, Item, ItemsResult, SearchItemsResponse};
