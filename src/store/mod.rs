//! Record store: one query contract, two backends.
//!
//! - [`snapshot::SnapshotStore`]: JSON snapshot loaded once, filtered with
//!   the in-memory engine.
//! - [`sql::SqlStore`]: SQLite, filters built per request with QueryBuilder.

pub mod snapshot;
pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::query::FilterSpec;
use crate::types::{CongressPage, CongressRecord};

pub use snapshot::SnapshotStore;
pub use sql::SqlStore;

/// The filter/facet/sort contract both backends implement. Implementations
/// are pure readers; records are never mutated at request time.
#[async_trait]
pub trait CongressStore: Send + Sync {
    /// One sorted page plus facet counts over the filtered set.
    async fn query_page(&self, spec: &FilterSpec) -> AppResult<CongressPage>;

    /// The filtered, sorted, unpaginated set (export path).
    async fn query_all(&self, spec: &FilterSpec) -> AppResult<Vec<CongressRecord>>;

    /// Total record count; doubles as the health probe.
    async fn count(&self) -> AppResult<i64>;
}

/// Build the configured backend. The pool must be present for "sqlite".
pub fn build_store(
    cfg: &AppConfig,
    pool: Option<sqlx::SqlitePool>,
) -> AppResult<Arc<dyn CongressStore>> {
    match cfg.data.backend.as_str() {
        "snapshot" => {
            let store = SnapshotStore::new(&cfg.data.snapshot_path);
            // Warm the cache so the first request does not pay the load.
            store.warm_up();
            Ok(Arc::new(store))
        }
        "sqlite" => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("sqlite backend selected but no pool was built"))
            })?;
            Ok(Arc::new(SqlStore::new(pool)))
        }
        other => Err(AppError::Internal(anyhow::anyhow!("unknown data backend {:?}", other))),
    }
}
