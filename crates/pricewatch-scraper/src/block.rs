//! Block-page detection.
//!
//! Detection is a pure function over the page text and a fixed marker set so
//! it can be tested without live traffic. Matching is case-sensitive: the
//! markers are verbatim strings the marketplace renders on its interstitial
//! pages, and loosening the comparison risks false positives on product copy.

/// Known block-page markers, checked verbatim against the fetched body.
pub const BLOCK_MARKERS: &[&str] = &[
    "Robot Check",
    "Enter the characters you see below",
    "api-services-support@amazon.com",
    "Inserisci i caratteri visualizzati",
    "Non siamo un robot",
];

/// Returns `true` when `body` contains any known block marker.
#[must_use]
pub fn is_block_page(body: &str) -> bool {
    BLOCK_MARKERS.iter().any(|marker| body.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_robot_check_interstitial() {
        let body = "<html><head><title>Robot Check</title></head><body>\
                    <p>Enter the characters you see below</p></body></html>";
        assert!(is_block_page(body));
    }

    #[test]
    fn detects_localized_interstitial() {
        assert!(is_block_page("<p>Inserisci i caratteri visualizzati</p>"));
        assert!(is_block_page("<p>Non siamo un robot</p>"));
    }

    #[test]
    fn detects_support_address_marker() {
        assert!(is_block_page(
            "contact api-services-support@amazon.com for assistance"
        ));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!is_block_page("robot check"));
        assert!(!is_block_page("ROBOT CHECK"));
    }

    #[test]
    fn clean_product_page_is_not_blocked() {
        let body = "<html><body><span id=\"productTitle\">Robot vacuum cleaner</span>\
                    <span class=\"a-offscreen\">199,99 €</span></body></html>";
        assert!(!is_block_page(body));
    }
}
