use serde::{Deserialize, Serialize};

/// Raw, per-source product fields before normalization.
///
/// Every acquisition source (partner API, page scrape, browser scrape, search
/// scrape) emits this shape. Each member is independently optional and kept
/// exactly as the source produced it; numeric-looking fields stay strings
/// until [`crate::normalize::normalize_fields`] converts them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProductFields {
    /// Stable external product code, e.g. `"B0C1XYZ123"`.
    pub asin: Option<String>,
    pub name: Option<String>,
    /// Price text as displayed, e.g. `"19,99 €"` or `"19.99"`.
    pub price: Option<String>,
    /// Crossed-out list price, e.g. `"24,99 €"`. Feeds discount derivation
    /// only; it never becomes the stored previous price.
    pub list_price: Option<String>,
    /// Discount badge text, e.g. `"-15%"`.
    pub discount: Option<String>,
    pub description: Option<String>,
    /// Rating text, e.g. `"4,3 su 5 stelle"`.
    pub rating: Option<String>,
    /// Review-count text, e.g. `"1.234 recensioni"`.
    pub reviews: Option<String>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    /// Search keyword the product was found under, when acquired by category.
    pub category: Option<String>,
}

/// Normalized product fields, ready for the store.
///
/// Produced only by [`crate::normalize::normalize_fields`], which guarantees
/// `asin`, `name` and `price` are present (the usability rule). `price` stays
/// an `Option` because the store's merge contract accepts a price-less patch
/// without clobbering a known price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFields {
    pub asin: String,
    pub name: String,
    /// Boundary note: this is a scrape-time `f64` convenience type.
    /// Persistence converts to `NUMERIC(10,2)` in the DB layer, so values are
    /// rounded to two decimal places at write time.
    pub price: Option<f64>,
    /// Discount percentage, e.g. `15.0` for 15% off.
    pub discount: Option<f64>,
    pub description: Option<String>,
    /// Star rating on the marketplace's 0-5 scale.
    ///
    /// Boundary note: converted to `NUMERIC(3,2)` when persisted.
    pub rating: Option<f64>,
    pub reviews: Option<i32>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub category: Option<String>,
}

impl ProductFields {
    /// Returns a minimal record carrying only identity and a price.
    ///
    /// Convenience constructor for callers that fill the remaining fields
    /// incrementally (search-result candidates carry little beyond these).
    #[must_use]
    pub fn new(asin: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            asin: asin.into(),
            name: name.into(),
            price: Some(price),
            discount: None,
            description: None,
            rating: None,
            reviews: None,
            availability: None,
            image_url: None,
            affiliate_link: None,
            category: None,
        }
    }

    /// Returns `true` when the record satisfies the usability rule:
    /// identifier, name and price all present.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.asin.is_empty() && !self.name.is_empty() && self.price.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_identity_and_price_only() {
        let fields = ProductFields::new("B0TEST", "Widget", 19.99);
        assert_eq!(fields.asin, "B0TEST");
        assert_eq!(fields.name, "Widget");
        assert_eq!(fields.price, Some(19.99));
        assert!(fields.discount.is_none());
        assert!(fields.affiliate_link.is_none());
    }

    #[test]
    fn is_usable_requires_price() {
        let mut fields = ProductFields::new("B0TEST", "Widget", 19.99);
        assert!(fields.is_usable());
        fields.price = None;
        assert!(!fields.is_usable());
    }

    #[test]
    fn raw_fields_default_is_fully_absent() {
        let raw = RawProductFields::default();
        assert!(raw.asin.is_none());
        assert!(raw.price.is_none());
        assert!(raw.category.is_none());
    }

    #[test]
    fn serde_roundtrip_preserves_optional_fields() {
        let fields = ProductFields {
            discount: Some(15.0),
            rating: Some(4.3),
            reviews: Some(1234),
            ..ProductFields::new("B0TEST", "Widget", 19.99)
        };
        let json = serde_json::to_string(&fields).expect("serialize");
        let back: ProductFields = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.asin, fields.asin);
        assert_eq!(back.rating, fields.rating);
        assert_eq!(back.reviews, fields.reviews);
    }
}
