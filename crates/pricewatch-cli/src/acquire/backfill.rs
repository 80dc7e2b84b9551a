//! Fire-and-forget affiliate-link backfill.
//!
//! A missing referral link is never a pipeline failure: lookups run as
//! spawned tasks, failures are logged, and the batch only awaits outstanding
//! tasks before printing its summary.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use pricewatch_paapi::PaapiClient;

pub(super) struct BackfillTracker {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackfillTracker {
    pub(super) fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns a lookup for one identifier's referral link. On success the
    /// link is stored only if still absent.
    pub(super) async fn schedule(&self, pool: sqlx::PgPool, api: Arc<PaapiClient>, asin: String) {
        let handle = tokio::spawn(async move {
            match api.affiliate_link(&asin).await {
                Ok(Some(url)) => {
                    match pricewatch_db::update_affiliate_link(&pool, &asin, &url).await {
                        Ok(true) => tracing::info!(asin, "affiliate link backfilled"),
                        Ok(false) => tracing::debug!(asin, "affiliate link already present"),
                        Err(e) => tracing::warn!(asin, error = %e, "affiliate link update failed"),
                    }
                }
                Ok(None) => tracing::debug!(asin, "no affiliate link available"),
                Err(e) => tracing::warn!(asin, error = %e, "affiliate link lookup failed"),
            }
        });
        self.handles.lock().await.push(handle);
    }

    /// Awaits all scheduled backfills. Panicked tasks are ignored; their
    /// failure was already confined to the spawned task.
    pub(super) async fn wait(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
    }
}
