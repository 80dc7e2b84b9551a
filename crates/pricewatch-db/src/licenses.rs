//! Database operations for the `licenses` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `licenses` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LicenseRow {
    pub id: i64,
    pub email: String,
    pub license_key: String,
    pub created_at: DateTime<Utc>,
}

/// Returns whether a license key is registered.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn license_exists(pool: &PgPool, key: &str) -> Result<bool, DbError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM licenses WHERE license_key = $1)")
            .bind(key)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Registers a license. Conflicts on either the email or the key are ignored,
/// so re-running a registration is safe.
///
/// Returns `true` if a new row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_license(pool: &PgPool, email: &str, key: &str) -> Result<bool, DbError> {
    let rows_affected =
        sqlx::query("INSERT INTO licenses (email, license_key) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(email)
            .bind(key)
            .execute(pool)
            .await?
            .rows_affected();
    Ok(rows_affected > 0)
}

/// Lists registered licenses, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_licenses(pool: &PgPool) -> Result<Vec<LicenseRow>, DbError> {
    let rows = sqlx::query_as::<_, LicenseRow>(
        "SELECT id, email, license_key, created_at FROM licenses ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
