use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use rust_decimal::Decimal;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricewatch_core::app_config::PaapiCredentials;
use pricewatch_core::{AppConfig, Environment, ProductFields};
use pricewatch_paapi::PaapiClient;
use pricewatch_scraper::PageScraper;

use super::backfill::BackfillTracker;
use super::pipeline::{acquire_by_category, acquire_one, Outcome, Sources};

const PRODUCT_HTML: &str = r#"<html><body>
    <span id="productTitle">Widget Deluxe 2000</span>
    <span class="a-price"><span class="a-offscreen">19,99 €</span></span>
</body></html>"#;

const SEARCH_HTML: &str = r#"<html><body>
    <div data-asin="B0USABLE01">
        <span class="a-text-normal">Usable Widget</span>
        <span class="a-price-whole">12,</span><span class="a-price-fraction">99</span>
    </div>
    <div data-asin="B0NOPRICE1">
        <span class="a-text-normal">Priceless Widget</span>
    </div>
</body></html>"#;

fn page_scraper(base_url: &str) -> PageScraper {
    PageScraper::with_base_url(base_url, "it-IT", 30, 0, 0).expect("page scraper construction")
}

fn api_client(base_url: &str) -> Arc<PaapiClient> {
    let client = PaapiClient::with_base_url(
        PaapiCredentials {
            access_key: "AKTEST".to_owned(),
            secret_key: "sekrit".to_owned(),
            partner_tag: "pricewatch-21".to_owned(),
        },
        "www.amazon.it",
        30,
        1,
        0, // zero base delay so rate-limit fallbacks run without real sleeps
        base_url,
    )
    .expect("API client construction");
    Arc::new(client)
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        marketplace: "www.amazon.it".to_string(),
        locale: "it-IT".to_string(),
        paapi_credentials: None,
        paapi_base_url: None,
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        request_timeout_secs: 30,
        max_concurrent: 3,
        min_delay_ms: 0,
        max_delay_ms: 0,
        max_retries: 1,
        retry_base_secs: 0,
        search_limit: 20,
    }
}

fn item_body(detail_page_url: &str) -> serde_json::Value {
    serde_json::json!({
        "items_result": {
            "items": [
                {
                    "asin": "B0TEST1234",
                    "title": "Widget Deluxe",
                    "price_display": "19,99 €",
                    "detail_page_url": detail_page_url
                }
            ]
        }
    })
}

#[sqlx::test(migrations = "../../migrations")]
async fn existing_record_with_link_short_circuits_all_sources(pool: sqlx::PgPool) {
    let mut fields = ProductFields::new("B0TEST1234", "Widget", 19.99);
    fields.affiliate_link = Some("https://example.com/existing".to_string());
    pricewatch_db::upsert_product(&pool, &fields)
        .await
        .expect("seed upsert failed");

    let page_server = MockServer::start().await;
    let sources = Sources {
        api: None,
        page: page_scraper(&page_server.uri()),
        browser: None,
    };
    let tracker = BackfillTracker::new();

    let outcome = acquire_one(&pool, &sources, &tracker, "B0TEST1234")
        .await
        .expect("acquire failed");
    let Outcome::Persisted(record) = outcome else {
        panic!("expected Persisted, got {outcome:?}");
    };
    assert_eq!(
        record.affiliate_link.as_deref(),
        Some("https://example.com/existing")
    );

    let requests = page_server.received_requests().await.expect("request log");
    assert!(requests.is_empty(), "no source may be contacted");
}

#[sqlx::test(migrations = "../../migrations")]
async fn existing_record_without_link_gets_backfill_only(pool: sqlx::PgPool) {
    pricewatch_db::upsert_product(&pool, &ProductFields::new("B0TEST1234", "Widget", 19.99))
        .await
        .expect("seed upsert failed");

    let api_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getitems"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(item_body("https://www.amazon.it/dp/B0TEST1234?tag=pw-21")),
        )
        .mount(&api_server)
        .await;

    let page_server = MockServer::start().await;
    let sources = Sources {
        api: Some(api_client(&api_server.uri())),
        page: page_scraper(&page_server.uri()),
        browser: None,
    };
    let tracker = BackfillTracker::new();

    let outcome = acquire_one(&pool, &sources, &tracker, "B0TEST1234")
        .await
        .expect("acquire failed");
    assert!(matches!(outcome, Outcome::PartialBackfill(_)));

    tracker.wait().await;

    let record = pricewatch_db::get_product(&pool, "B0TEST1234")
        .await
        .expect("get failed")
        .expect("record should exist");
    assert_eq!(
        record.affiliate_link.as_deref(),
        Some("https://www.amazon.it/dp/B0TEST1234?tag=pw-21")
    );

    let page_requests = page_server.received_requests().await.expect("request log");
    assert!(page_requests.is_empty(), "no re-scrape on short-circuit");

    // Only the backfill lookup reached the API.
    let api_requests = api_server.received_requests().await.expect("request log");
    assert_eq!(api_requests.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rate_limited_api_falls_back_to_page_scrape(pool: sqlx::PgPool) {
    let api_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getitems"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .mount(&api_server)
        .await;

    let page_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B0TEST1234"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_HTML))
        .mount(&page_server)
        .await;

    let sources = Sources {
        api: Some(api_client(&api_server.uri())),
        page: page_scraper(&page_server.uri()),
        browser: None,
    };
    let tracker = BackfillTracker::new();

    let outcome = acquire_one(&pool, &sources, &tracker, "B0TEST1234")
        .await
        .expect("acquire failed");
    let Outcome::PartialBackfill(persisted) = outcome else {
        panic!("expected PartialBackfill, got {outcome:?}");
    };
    assert_eq!(persisted.price, Some(Decimal::new(1999, 2)));

    // The scheduled backfill hits the still-throttled API and is logged only.
    tracker.wait().await;

    let record = pricewatch_db::get_product(&pool, "B0TEST1234")
        .await
        .expect("get failed")
        .expect("record should exist");
    assert_eq!(record.name, "Widget Deluxe 2000");
    assert_eq!(record.price, Some(Decimal::new(1999, 2)));
    assert!(record.affiliate_link.is_none());

    let history = pricewatch_db::list_price_history(&pool, "B0TEST1234", 10)
        .await
        .expect("history failed");
    assert_eq!(history.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn blocked_page_resolves_to_not_found(pool: sqlx::PgPool) {
    let page_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B0TEST1234"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Robot Check</title></head>\
             <body><p>Enter the characters you see below</p></body></html>",
        ))
        .mount(&page_server)
        .await;

    let sources = Sources {
        api: None,
        page: page_scraper(&page_server.uri()),
        browser: None,
    };
    let tracker = BackfillTracker::new();

    let outcome = acquire_one(&pool, &sources, &tracker, "B0TEST1234")
        .await
        .expect("acquire failed");
    assert!(matches!(outcome, Outcome::NotFound));

    let exists = pricewatch_db::product_exists(&pool, "B0TEST1234")
        .await
        .expect("exists failed");
    assert!(!exists, "a blocked fetch must persist nothing");
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_candidates_persist_independently(pool: sqlx::PgPool) {
    let page_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_HTML))
        .mount(&page_server)
        .await;

    let sources = Sources {
        api: None,
        page: page_scraper(&page_server.uri()),
        browser: None,
    };
    let tracker = BackfillTracker::new();
    let config = test_config();

    let outcomes = acquire_by_category(&pool, &sources, &tracker, &config, "widget").await;
    assert_eq!(outcomes.len(), 2);

    let usable = outcomes
        .iter()
        .find(|(asin, _)| asin == "B0USABLE01")
        .expect("usable candidate present");
    assert!(matches!(usable.1, Ok(Outcome::PartialBackfill(_))));

    let priceless = outcomes
        .iter()
        .find(|(asin, _)| asin == "B0NOPRICE1")
        .expect("priceless candidate present");
    assert!(matches!(priceless.1, Ok(Outcome::NotFound)));

    let record = pricewatch_db::get_product(&pool, "B0USABLE01")
        .await
        .expect("get failed")
        .expect("usable candidate persisted");
    assert_eq!(record.price, Some(Decimal::new(1299, 2)));
    assert_eq!(record.category.as_deref(), Some("widget"));

    let exists = pricewatch_db::product_exists(&pool, "B0NOPRICE1")
        .await
        .expect("exists failed");
    assert!(!exists, "unusable candidate must not be persisted");
}
