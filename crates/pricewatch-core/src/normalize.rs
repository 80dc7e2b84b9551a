//! Pure field normalization: locale-formatted price, rating and review-count
//! strings to canonical numeric values.
//!
//! These functions use manual byte scanning rather than `regex` to stay
//! dependency-light. They hold no state and do no I/O, so every acquisition
//! source funnels through the same conversion rules. Each is idempotent:
//! feeding a function its own rendered output returns the same value.

use crate::fields::{ProductFields, RawProductFields};

/// Converts a displayed price string to a positive amount.
///
/// Strips everything except digits and separators, resolves the locale
/// separator convention, and rounds to two decimal places:
/// - `"19,99 €"` → `19.99`
/// - `"1.234,56"` → `1234.56` (comma decimal, dot thousands)
/// - `"1,234.56"` → `1234.56` (dot decimal, comma thousands)
/// - `"1.234"` → `1234.0` (a lone dot followed by exactly three digits
///   groups thousands; `"12.99"` stays `12.99`)
///
/// Returns `None` for anything zero, negative, or non-numeric after cleaning.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let canonical = resolve_separators(&cleaned);
    match canonical.parse::<f64>() {
        Ok(value) => {
            let rounded = (value * 100.0).round() / 100.0;
            (rounded > 0.0).then_some(rounded)
        }
        Err(_) => None,
    }
}

/// Extracts a star rating from a rating string.
///
/// Takes the first numeric token, maps a comma decimal separator to a dot,
/// and rounds to one decimal place: `"4,3 su 5 stelle"` → `4.3`.
///
/// Returns `None` when the string holds no numeric token.
#[must_use]
pub fn normalize_rating(raw: &str) -> Option<f64> {
    let token = first_numeric_token(raw)?;
    token
        .parse::<f64>()
        .ok()
        .map(|value| (value * 10.0).round() / 10.0)
}

/// Extracts a review count by stripping every non-digit character:
/// `"1.234 recensioni"` → `1234`.
///
/// Returns `None` when no digits remain or the count overflows `i32`.
#[must_use]
pub fn normalize_reviews(raw: &str) -> Option<i32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i32>().ok()
}

/// Extracts a discount percentage from a badge string: `"-15%"` → `15.0`.
///
/// Returns `None` for zero or non-numeric input.
#[must_use]
pub fn normalize_discount(raw: &str) -> Option<f64> {
    let token = first_numeric_token(raw)?;
    match token.parse::<f64>() {
        Ok(value) => {
            let rounded = (value * 100.0).round() / 100.0;
            (rounded > 0.0).then_some(rounded)
        }
        Err(_) => None,
    }
}

/// Normalizes one source's raw fields into a store-ready record.
///
/// Applies the per-field converters, trims free-text fields to `None` when
/// empty, and enforces the usability rule in one place: the result is `Some`
/// only when identifier, name and price all survive normalization. When no
/// discount badge parsed, derives the percentage from the list price.
#[must_use]
pub fn normalize_fields(raw: &RawProductFields) -> Option<ProductFields> {
    let asin = non_empty(raw.asin.as_deref())?;
    let name = non_empty(raw.name.as_deref())?;
    let price = raw.price.as_deref().and_then(normalize_price)?;

    let list_price = raw.list_price.as_deref().and_then(normalize_price);
    let discount = raw
        .discount
        .as_deref()
        .and_then(normalize_discount)
        .or_else(|| derived_discount(price, list_price));

    Some(ProductFields {
        asin,
        name,
        price: Some(price),
        discount,
        description: non_empty(raw.description.as_deref()),
        rating: raw.rating.as_deref().and_then(normalize_rating),
        reviews: raw.reviews.as_deref().and_then(normalize_reviews),
        availability: non_empty(raw.availability.as_deref()),
        image_url: non_empty(raw.image_url.as_deref()),
        affiliate_link: non_empty(raw.affiliate_link.as_deref()),
        category: non_empty(raw.category.as_deref()),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Resolves `.`/`,` into a single canonical `.` decimal separator.
///
/// When both appear, the rightmost one is the decimal point and the other
/// groups thousands. A repeated separator always groups thousands. A lone
/// `.` followed by exactly three trailing digits groups thousands; a lone
/// `,` is a decimal point (target-locale convention).
fn resolve_separators(cleaned: &str) -> String {
    match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => {
            if comma > dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(_)) => {
            if cleaned.matches(',').count() > 1 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (Some(dot), None) => {
            if cleaned.matches('.').count() > 1 || cleaned.len() - dot == 4 {
                cleaned.replace('.', "")
            } else {
                cleaned.to_string()
            }
        }
        (None, None) => cleaned.to_string(),
    }
}

/// Returns the first run of digits in `raw`, with at most one embedded
/// separator mapped to `.`: `"4,3 su 5"` → `"4.3"`.
fn first_numeric_token(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut token = String::new();
    let mut seen_separator = false;
    for &b in &bytes[start..] {
        match b {
            b'0'..=b'9' => token.push(char::from(b)),
            b'.' | b',' if !seen_separator => {
                seen_separator = true;
                token.push('.');
            }
            _ => break,
        }
    }
    if token.ends_with('.') {
        token.pop();
    }
    Some(token)
}

/// Trims a free-text field, dropping it entirely when blank.
fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Derives a discount percentage from the list price when the page showed no
/// badge. Requires the list price to actually exceed the current price.
fn derived_discount(price: f64, list_price: Option<f64>) -> Option<f64> {
    let list = list_price?;
    if list <= price {
        return None;
    }
    Some(((list - price) / list * 100.0 * 100.0).round() / 100.0)
}
