//! Offline unit tests for pricewatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use pricewatch_core::{AppConfig, Environment};
use pricewatch_db::{PoolConfig, PriceHistoryRow, ProductRow};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        marketplace: "www.amazon.it".to_string(),
        locale: "it-IT".to_string(),
        paapi_credentials: None,
        paapi_base_url: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        request_timeout_secs: 30,
        max_concurrent: 3,
        min_delay_ms: 1000,
        max_delay_ms: 3000,
        max_retries: 5,
        retry_base_secs: 5,
        search_limit: 20,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    let row = ProductRow {
        id: 42_i64,
        asin: "B0TEST1234".to_string(),
        name: "Widget Deluxe".to_string(),
        price: Some(Decimal::new(1999, 2)),
        old_price: None,
        discount: Some(Decimal::new(2000, 2)),
        description: None,
        rating: Some(Decimal::new(43, 1)),
        reviews: Some(1234),
        availability: Some("Disponibilità immediata".to_string()),
        image_url: None,
        affiliate_link: None,
        category: Some("widgets".to_string()),
        scraped_at: Utc::now(),
    };

    assert_eq!(row.id, 42);
    assert_eq!(row.asin, "B0TEST1234");
    assert_eq!(row.price, Some(Decimal::new(1999, 2)));
    assert!(row.old_price.is_none());
    assert!(row.affiliate_link.is_none());
}

/// Compile-time smoke test for [`PriceHistoryRow`].
#[test]
fn price_history_row_has_expected_fields() {
    let row = PriceHistoryRow {
        id: 7_i64,
        asin: "B0TEST1234".to_string(),
        price: Decimal::new(1999, 2),
        old_price: Some(Decimal::new(2499, 2)),
        rating: None,
        reviews: None,
        price_diff: Some(Decimal::new(500, 2)),
        rolling_avg_7: Some(Decimal::new(2249, 2)),
        rolling_avg_14: Some(Decimal::new(2249, 2)),
        rolling_avg_30: Some(Decimal::new(2249, 2)),
        observed_at: Utc::now(),
    };

    assert_eq!(row.price, Decimal::new(1999, 2));
    assert_eq!(row.price_diff, Some(Decimal::new(500, 2)));
}
