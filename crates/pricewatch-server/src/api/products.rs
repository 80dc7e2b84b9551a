//! Read-only product and history routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use pricewatch_db::{PriceHistoryRow, ProductRow};

use super::{map_db_error, normalize_limit, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LimitQuery {
    limit: Option<i64>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let rows = pricewatch_db::list_products(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(&e))?;
    Ok(Json(rows))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Path(asin): Path<String>,
) -> Result<Json<ProductRow>, ApiError> {
    let record = pricewatch_db::get_product(&state.pool, &asin)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::new("not_found", format!("no record for {asin}")))?;
    Ok(Json(record))
}

pub(super) async fn list_price_history(
    State(state): State<AppState>,
    Path(asin): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<PriceHistoryRow>>, ApiError> {
    let exists = pricewatch_db::product_exists(&state.pool, &asin)
        .await
        .map_err(|e| map_db_error(&e))?;
    if !exists {
        return Err(ApiError::new("not_found", format!("no record for {asin}")));
    }

    let limit = normalize_limit(query.limit);
    let rows = pricewatch_db::list_price_history(&state.pool, &asin, limit)
        .await
        .map_err(|e| map_db_error(&e))?;
    Ok(Json(rows))
}
