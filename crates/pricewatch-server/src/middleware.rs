//! License-key authentication for the product routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::PgPool;

pub(crate) const LICENSE_HEADER: &str = "x-license-key";

/// State handed to the auth middleware: keys live in the `licenses` table, so
/// the middleware only needs the pool.
#[derive(Clone)]
pub struct AuthState {
    pub pool: PgPool,
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware requiring a registered license key in `X-License-Key`.
///
/// A missing or unknown key is a 401; a database failure while checking is a
/// 500, never a silent pass.
pub async fn require_license_key(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get(LICENSE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    let Some(key) = key else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing X-License-Key header",
        );
    };

    match pricewatch_db::license_exists(&state.pool, key).await {
        Ok(true) => next.run(request).await,
        Ok(false) => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "unknown license key",
        ),
        Err(e) => {
            tracing::error!(error = %e, "license lookup failed");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "license lookup failed",
            )
        }
    }
}
