//! Database operations for `product_prices` and `price_history`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use pricewatch_core::ProductFields;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `product_prices` table: the current known state for one
/// product identifier.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub asin: String,
    pub name: String,
    /// `NULL` only when no source has ever produced a usable price.
    pub price: Option<Decimal>,
    /// The current price at the time of the last observed price change.
    pub old_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub description: Option<String>,
    pub rating: Option<Decimal>,
    pub reviews: Option<i32>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub category: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// A row from the `price_history` table: one append-only observation.
///
/// `price_diff` is a generated column (`old_price - price`); the rolling
/// averages are computed at insert time over the 7/14/30 most recent
/// observations including this one.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub id: i64,
    pub asin: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub reviews: Option<i32>,
    pub price_diff: Option<Decimal>,
    pub rolling_avg_7: Option<Decimal>,
    pub rolling_avg_14: Option<Decimal>,
    pub rolling_avg_30: Option<Decimal>,
    pub observed_at: DateTime<Utc>,
}

/// Result of an upsert: the merged record plus whether a referral link is
/// already stored, so the caller can decide whether to schedule a backfill.
#[derive(Debug, Clone)]
pub struct StoreResult {
    pub record: ProductRow,
    pub referral_link_present: bool,
}

const PRODUCT_COLUMNS: &str = "id, asin, name, price, old_price, discount, description, \
     rating, reviews, availability, image_url, affiliate_link, category, scraped_at";

// ---------------------------------------------------------------------------
// product_prices operations
// ---------------------------------------------------------------------------

/// Returns whether a record exists for the identifier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_exists(pool: &PgPool, asin: &str) -> Result<bool, DbError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM product_prices WHERE asin = $1)")
            .bind(asin)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Fetches the current record for an identifier, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, asin: &str) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product_prices WHERE asin = $1"
    ))
    .bind(asin)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Upserts a product record and appends one history observation, in a single
/// transaction.
///
/// Merge policy on conflict: non-null incoming fields overwrite stored ones;
/// a null incoming field never clobbers a known value. A price change shifts
/// the stored current price into `old_price` before the new price is applied;
/// a null incoming price leaves both price columns untouched.
///
/// The history row is computed from the merged state, so a fetch that carried
/// no price still yields an observation at the last known price. Rolling
/// averages cover the 7/14/30 most recent observations including the new one,
/// over however many rows actually exist. No observation is appended while
/// the merged price is still null.
///
/// Numeric fields are bound as `f64` and cast to the fixed-scale `NUMERIC`
/// columns by the database engine, which rounds scrape-time floating values
/// on persistence.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails; the transaction is
/// rolled back and nothing is persisted.
pub async fn upsert_product(pool: &PgPool, fields: &ProductFields) -> Result<StoreResult, DbError> {
    let mut tx = pool.begin().await?;

    // The ON CONFLICT row lock serializes concurrent upserts per identifier
    // for the rest of the transaction, so the history append below reads a
    // stable merged state.
    let record = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO product_prices \
             (asin, name, price, discount, description, rating, reviews, \
              availability, image_url, affiliate_link, category) \
         VALUES ($1, $2, $3::numeric(10,2), $4::numeric(5,2), $5, $6::numeric(3,2), $7, \
                 $8, $9, $10, $11) \
         ON CONFLICT (asin) DO UPDATE SET \
             name           = EXCLUDED.name, \
             old_price      = CASE \
                 WHEN EXCLUDED.price IS NOT NULL \
                  AND product_prices.price IS NOT NULL \
                  AND EXCLUDED.price <> product_prices.price \
                 THEN product_prices.price \
                 ELSE product_prices.old_price \
             END, \
             price          = COALESCE(EXCLUDED.price, product_prices.price), \
             discount       = COALESCE(EXCLUDED.discount, product_prices.discount), \
             description    = COALESCE(EXCLUDED.description, product_prices.description), \
             rating         = COALESCE(EXCLUDED.rating, product_prices.rating), \
             reviews        = COALESCE(EXCLUDED.reviews, product_prices.reviews), \
             availability   = COALESCE(EXCLUDED.availability, product_prices.availability), \
             image_url      = COALESCE(EXCLUDED.image_url, product_prices.image_url), \
             affiliate_link = COALESCE(EXCLUDED.affiliate_link, product_prices.affiliate_link), \
             category       = COALESCE(EXCLUDED.category, product_prices.category), \
             scraped_at     = NOW() \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&fields.asin)
    .bind(&fields.name)
    .bind(fields.price)
    .bind(fields.discount)
    .bind(fields.description.as_deref())
    .bind(fields.rating)
    .bind(fields.reviews)
    .bind(fields.availability.as_deref())
    .bind(fields.image_url.as_deref())
    .bind(fields.affiliate_link.as_deref())
    .bind(fields.category.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(price) = record.price {
        sqlx::query(
            "WITH recent AS ( \
                 SELECT price, \
                        ROW_NUMBER() OVER (ORDER BY observed_at DESC, id DESC) AS rn \
                 FROM price_history \
                 WHERE asin = $1 \
             ) \
             INSERT INTO price_history \
                 (asin, price, old_price, rating, reviews, \
                  rolling_avg_7, rolling_avg_14, rolling_avg_30) \
             SELECT $1, $2, $3, $4, $5, \
                 ROUND((COALESCE((SELECT SUM(price) FROM recent WHERE rn <= 6), 0) + $2) \
                       / ((SELECT COUNT(*) FROM recent WHERE rn <= 6) + 1), 2), \
                 ROUND((COALESCE((SELECT SUM(price) FROM recent WHERE rn <= 13), 0) + $2) \
                       / ((SELECT COUNT(*) FROM recent WHERE rn <= 13) + 1), 2), \
                 ROUND((COALESCE((SELECT SUM(price) FROM recent WHERE rn <= 29), 0) + $2) \
                       / ((SELECT COUNT(*) FROM recent WHERE rn <= 29) + 1), 2)",
        )
        .bind(&record.asin)
        .bind(price)
        .bind(record.old_price)
        .bind(record.rating)
        .bind(record.reviews)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let referral_link_present = record.affiliate_link.is_some();
    Ok(StoreResult {
        record,
        referral_link_present,
    })
}

/// Sets the affiliate link only if none is stored yet.
///
/// Returns `true` if the row was updated, `false` if the record is missing or
/// already carries a link. Idempotent: a repeated backfill is a no-op.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_affiliate_link(pool: &PgPool, asin: &str, url: &str) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "UPDATE product_prices SET affiliate_link = $2 \
         WHERE asin = $1 AND affiliate_link IS NULL",
    )
    .bind(asin)
    .bind(url)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Lists records most recently observed first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool, limit: i64) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product_prices \
         ORDER BY scraped_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Lists history observations for an identifier, newest first.
///
/// Ordered by `observed_at DESC, id DESC` so the first row is always the
/// latest, even when observations share a timestamp.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_price_history(
    pool: &PgPool,
    asin: &str,
    limit: i64,
) -> Result<Vec<PriceHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceHistoryRow>(
        "SELECT id, asin, price, old_price, rating, reviews, price_diff, \
                rolling_avg_7, rolling_avg_14, rolling_avg_30, observed_at \
         FROM price_history \
         WHERE asin = $1 \
         ORDER BY observed_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(asin)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes a record; history rows go with it via the cascade.
///
/// Returns `true` if a record was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, asin: &str) -> Result<bool, DbError> {
    let rows_affected = sqlx::query("DELETE FROM product_prices WHERE asin = $1")
        .bind(asin)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}
