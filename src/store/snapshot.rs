//! Flat-file backend: the JSON snapshot produced by the import tool, read
//! once on first access and memoized for the process lifetime. Concurrent
//! requests share the immutable snapshot; there is no teardown.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::query::{engine, FilterSpec};
use crate::store::CongressStore;
use crate::types::{CongressPage, CongressRecord};

pub struct SnapshotStore {
    path: PathBuf,
    cache: OnceLock<Vec<CongressRecord>>,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), cache: OnceLock::new() }
    }

    /// The loaded snapshot. Only a successful load is memoized, so a missing
    /// file keeps erroring (and `/health` keeps reporting 503) until the
    /// operator regenerates it.
    pub fn records(&self) -> AppResult<&[CongressRecord]> {
        if let Some(records) = self.cache.get() {
            return Ok(records);
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::Snapshot(format!(
                "Failed to read congress data file at {}: {}. Run \"medicalmap-import <workbook.xlsx> --snapshot\" to generate it.",
                self.path.display(),
                e
            ))
        })?;
        let records: Vec<CongressRecord> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Snapshot(format!(
                "Failed to parse congress data file at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::info!("Loaded {} congresses from {}", records.len(), self.path.display());
        Ok(self.cache.get_or_init(|| records))
    }

    /// Eagerly warm the cache at startup; failures are reported, not fatal.
    pub fn warm_up(&self) {
        if let Err(e) = self.records() {
            tracing::warn!("{}", e);
        }
    }
}

#[async_trait]
impl CongressStore for SnapshotStore {
    async fn query_page(&self, spec: &FilterSpec) -> AppResult<CongressPage> {
        Ok(engine::run(self.records()?, spec))
    }

    async fn query_all(&self, spec: &FilterSpec) -> AppResult<Vec<CongressRecord>> {
        Ok(engine::filter_all(self.records()?, spec))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.records()?.len() as i64)
    }
}
