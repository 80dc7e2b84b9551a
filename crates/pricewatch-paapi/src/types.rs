//! Partner API wire types.
//!
//! The API speaks JSON-over-POST: one endpoint per operation, the request
//! body carrying the partner tag and marketplace alongside the operation
//! parameters. Responses wrap the item list in a per-operation envelope.

use pricewatch_core::RawProductFields;
use serde::{Deserialize, Serialize};

/// Item attributes requested on every lookup. The API only materialises the
/// fields named here, so the set must cover everything the store persists.
pub(crate) const ITEM_RESOURCES: &[&str] = &[
    "ItemInfo.Title",
    "ItemInfo.Features",
    "Offers.Listings.Price",
    "Offers.Listings.Availability",
    "CustomerReviews.StarRating",
    "CustomerReviews.Count",
    "Images.Primary.Large",
];

/// Request body for the `getitems` operation.
#[derive(Debug, Serialize)]
pub(crate) struct GetItemsRequest<'a> {
    pub item_ids: Vec<&'a str>,
    pub partner_tag: &'a str,
    pub marketplace: &'a str,
    pub resources: &'a [&'a str],
}

/// Request body for the `searchitems` operation.
#[derive(Debug, Serialize)]
pub(crate) struct SearchItemsRequest<'a> {
    pub keywords: &'a str,
    pub item_count: usize,
    pub partner_tag: &'a str,
    pub marketplace: &'a str,
}

/// Response envelope for `getitems`: `{ "items_result": { "items": [...] } }`.
#[derive(Debug, Deserialize)]
pub struct GetItemsResponse {
    pub items_result: ItemsResult,
}

/// Response envelope for `searchitems`: `{ "search_result": { "items": [...] } }`.
#[derive(Debug, Deserialize)]
pub struct SearchItemsResponse {
    pub search_result: ItemsResult,
}

/// Inner item list shared by both envelopes. An unknown identifier yields an
/// empty list rather than an HTTP error.
#[derive(Debug, Deserialize)]
pub struct ItemsResult {
    #[serde(default)]
    pub items: Vec<Item>,
}

/// One product as the partner API reports it.
///
/// `price` is the machine amount and `price_display` the locale-formatted
/// string (`"19,99 €"`). Both feed [`RawProductFields::price`] as text so the
/// normalizer stays the single conversion boundary for every source.
#[derive(Debug, Deserialize)]
pub struct Item {
    pub asin: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_display: Option<String>,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<i64>,
    /// Product page URL carrying the partner tag; becomes the referral link.
    #[serde(default)]
    pub detail_page_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Item {
    /// Converts the wire item into the raw field carrier every source emits.
    #[must_use]
    pub fn into_raw_fields(self) -> RawProductFields {
        let price = self
            .price_display
            .or_else(|| self.price.map(|p| format!("{p:.2}")));
        RawProductFields {
            asin: Some(self.asin),
            name: self.title,
            price,
            list_price: self.list_price.map(|p| format!("{p:.2}")),
            discount: None,
            description: self.description,
            rating: self.rating.map(|r| r.to_string()),
            reviews: self.review_count.map(|c| c.to_string()),
            availability: self.availability,
            image_url: self.image_url,
            affiliate_link: self.detail_page_url,
            category: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_item() -> Item {
        Item {
            asin: "B0TEST1234".to_string(),
            title: Some("Widget Deluxe".to_string()),
            price: Some(19.99),
            price_display: Some("19,99 €".to_string()),
            list_price: Some(24.99),
            description: Some("A quality widget.".to_string()),
            availability: Some("In Stock".to_string()),
            rating: Some(4.3),
            review_count: Some(1234),
            detail_page_url: Some("https://www.amazon.it/dp/B0TEST1234?tag=pw-21".to_string()),
            image_url: Some("https://img.example/widget.jpg".to_string()),
        }
    }

    #[test]
    fn into_raw_fields_prefers_display_price() {
        let raw = full_item().into_raw_fields();
        assert_eq!(raw.price.as_deref(), Some("19,99 €"));
        assert_eq!(raw.list_price.as_deref(), Some("24.99"));
    }

    #[test]
    fn into_raw_fields_falls_back_to_machine_price() {
        let mut item = full_item();
        item.price_display = None;
        let raw = item.into_raw_fields();
        assert_eq!(raw.price.as_deref(), Some("19.99"));
    }

    #[test]
    fn into_raw_fields_maps_detail_page_url_to_affiliate_link() {
        let raw = full_item().into_raw_fields();
        assert_eq!(
            raw.affiliate_link.as_deref(),
            Some("https://www.amazon.it/dp/B0TEST1234?tag=pw-21")
        );
    }

    #[test]
    fn into_raw_fields_keeps_missing_members_absent() {
        let item = Item {
            asin: "B0BARE".to_string(),
            title: None,
            price: None,
            price_display: None,
            list_price: None,
            description: None,
            availability: None,
            rating: None,
            review_count: None,
            detail_page_url: None,
            image_url: None,
        };
        let raw = item.into_raw_fields();
        assert_eq!(raw.asin.as_deref(), Some("B0BARE"));
        assert!(raw.price.is_none());
        assert!(raw.affiliate_link.is_none());
    }
}
