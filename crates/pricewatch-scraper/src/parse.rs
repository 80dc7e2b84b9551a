//! CSS-selector field extraction for product and search-result pages.
//!
//! Extraction is tolerant: every field is independently optional and a
//! missing one stays absent rather than being defaulted. Usability
//! (identifier + name + price) is enforced later by the normalizer, not here.

use pricewatch_core::RawProductFields;
use scraper::{ElementRef, Html, Selector};

/// Maximum number of candidates returned from one search-results page.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// Parses one product detail page into raw fields.
///
/// The caller supplies the identifier: the page itself does not repeat it in
/// a stable location, and the fetch URL is already keyed by it.
#[must_use]
pub fn parse_product_page(html: &str, asin: &str) -> RawProductFields {
    let document = Html::parse_document(html);

    let price = select_text(&document, "span.a-price span.a-offscreen")
        .or_else(|| select_text(&document, "#priceblock_ourprice"));

    RawProductFields {
        asin: Some(asin.to_owned()),
        name: select_text(&document, "#productTitle"),
        price,
        list_price: select_text(&document, "span.a-price.a-text-price span.a-offscreen"),
        discount: None,
        description: select_text(&document, "#feature-bullets"),
        rating: select_text(&document, "span.a-icon-alt"),
        reviews: select_text(&document, "#acrCustomerReviewText"),
        availability: select_text(&document, "#availability span"),
        image_url: select_attr(&document, "#landingImage", "src"),
        affiliate_link: None,
        category: None,
    }
}

/// Parses a search-results page into at most [`MAX_SEARCH_RESULTS`] raw
/// candidates, tagged with the search keyword as their category.
///
/// Result containers are `div[data-asin]` elements with a non-empty
/// `data-asin`; the marketplace pads the grid with empty-identifier
/// placeholders that are skipped here.
#[must_use]
pub fn parse_search_page(html: &str, keyword: &str, limit: usize) -> Vec<RawProductFields> {
    let document = Html::parse_document(html);
    let container = selector("div[data-asin]");

    document
        .select(&container)
        .filter_map(|element| {
            let asin = element.value().attr("data-asin")?.trim();
            if asin.is_empty() {
                return None;
            }
            Some(parse_search_card(&element, asin, keyword))
        })
        .take(limit.min(MAX_SEARCH_RESULTS))
        .collect()
}

fn parse_search_card(card: &ElementRef<'_>, asin: &str, keyword: &str) -> RawProductFields {
    let whole = select_text_in(card, "span.a-price-whole");
    let fraction = select_text_in(card, "span.a-price-fraction");
    let price = whole.map(|w| match fraction {
        Some(f) => format!("{w}{f}"),
        None => w,
    });

    RawProductFields {
        asin: Some(asin.to_owned()),
        name: select_text_in(card, "span.a-text-normal"),
        price,
        list_price: None,
        discount: None,
        description: None,
        rating: select_text_in(card, "span.a-icon-alt"),
        reviews: None,
        availability: None,
        image_url: card
            .select(&selector("img.s-image"))
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(ToOwned::to_owned),
        affiliate_link: None,
        category: Some(keyword.to_owned()),
    }
}

// ---------------------------------------------------------------------------
// Selector helpers
// ---------------------------------------------------------------------------

/// Builds a selector from a static CSS string. All selectors in this module
/// are fixed literals, so parse failure is a programming error.
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

fn select_text(document: &Html, css: &'static str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .map(|e| collect_text(&e))
        .filter(|s| !s.is_empty())
}

fn select_text_in(scope: &ElementRef<'_>, css: &'static str) -> Option<String> {
    scope
        .select(&selector(css))
        .next()
        .map(|e| collect_text(&e))
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, css: &'static str, attr: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(ToOwned::to_owned)
}

fn collect_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}
