//! Repository layer for warm-up progress

pub mod fs;
pub mod memory;
pub mod postgres;

use crate::db::DatabasePool;
use crate::models::WarmupStatus;
use async_trait::async_trait;
use ipwarm_common::config::StoreConfig;
use ipwarm_common::{Error, Result};
use std::sync::Arc;

pub use fs::FsWarmupStatusRepository;
pub use memory::InMemoryWarmupStatusRepository;
pub use postgres::DbWarmupStatusRepository;

/// Entity name used in conflict errors
pub(crate) const ENTITY: &str = "WarmupStatus";

/// Warm-up progress repository, one record per pool name.
///
/// Every successful write returns the stored record with its bumped
/// `version`. Callers that read-modify-write must go through [`update`]
/// so that two concurrent writers cannot both succeed.
///
/// [`update`]: WarmupStatusRepository::update
#[async_trait]
pub trait WarmupStatusRepository: Send + Sync {
    /// Get the status of a pool
    async fn get(&self, pool_name: &str) -> Result<Option<WarmupStatus>>;

    /// Insert or overwrite the status of a pool, ignoring its current version
    async fn save(&self, status: &WarmupStatus) -> Result<WarmupStatus>;

    /// Overwrite the status only if the stored version still equals
    /// `expected_version`. Returns `Error::Conflict` otherwise and
    /// `Error::NotFound` if there is no record to update.
    async fn update(&self, status: &WarmupStatus, expected_version: i64) -> Result<WarmupStatus>;
}

pub(crate) fn conflict(pool_name: &str, expected_version: i64) -> Error {
    Error::Conflict {
        entity: ENTITY.to_string(),
        key: pool_name.to_string(),
        expected: expected_version,
    }
}

pub(crate) fn not_found(pool_name: &str) -> Error {
    Error::NotFound(format!("Warm-up status for pool '{}'", pool_name))
}

/// Create the progress repository selected by configuration
pub async fn create_repository(config: &StoreConfig) -> Result<Arc<dyn WarmupStatusRepository>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryWarmupStatusRepository::new())),
        "fs" => Ok(Arc::new(FsWarmupStatusRepository::new(&config.path)?)),
        "postgres" => {
            let pool = DatabasePool::new(config).await?;
            pool.migrate().await?;
            Ok(Arc::new(DbWarmupStatusRepository::new(pool)))
        }
        other => Err(Error::Config(format!(
            "Unsupported store backend: {}",
            other
        ))),
    }
}
