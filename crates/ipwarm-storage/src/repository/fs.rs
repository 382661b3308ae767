//! File-system warm-up progress repository
//!
//! Stores one `<pool_name>.json` document per pool under a base directory.
//! Writes go to a temporary file first and are then renamed into place, so
//! a crash never leaves a half-written record behind. Compare-and-write is
//! serialized inside the process; running two processes against the same
//! directory is not supported.

use super::{conflict, not_found, WarmupStatusRepository};
use crate::models::WarmupStatus;
use async_trait::async_trait;
use ipwarm_common::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// JSON-file backed repository
pub struct FsWarmupStatusRepository {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FsWarmupStatusRepository {
    /// Create the repository, creating the base directory if needed
    pub fn new(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| Error::Storage(format!("Failed to create storage directory: {}", e)))?;

        info!(path = %path.display(), "Initialized warm-up progress directory");

        Ok(Self {
            base_path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// File path for a pool, rejecting names that would escape the base directory
    fn status_path(&self, pool_name: &str) -> Result<PathBuf> {
        if pool_name.is_empty() {
            return Err(Error::Validation("Pool name must not be empty".to_string()));
        }

        if pool_name.contains("..")
            || pool_name.contains('/')
            || pool_name.contains('\\')
            || pool_name.contains('\0')
        {
            return Err(Error::Storage(format!(
                "Path traversal detected in pool name '{}'",
                pool_name
            )));
        }

        Ok(self.base_path.join(format!("{}.json", pool_name)))
    }

    async fn read_status(&self, path: &Path) -> Result<Option<WarmupStatus>> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(format!("Failed to read status file: {}", e))),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| Error::Storage(format!("Corrupt status file {}: {}", path.display(), e)))
    }

    async fn write_status(&self, path: &Path, status: &WarmupStatus) -> Result<()> {
        let data = serde_json::to_vec_pretty(status)
            .map_err(|e| Error::Storage(format!("Failed to serialize status: {}", e)))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &data)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write status file: {}", e)))?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to replace status file: {}", e)))?;

        debug!(path = %path.display(), size = data.len(), "Stored warm-up status");

        Ok(())
    }
}

#[async_trait]
impl WarmupStatusRepository for FsWarmupStatusRepository {
    async fn get(&self, pool_name: &str) -> Result<Option<WarmupStatus>> {
        let path = self.status_path(pool_name)?;
        self.read_status(&path).await
    }

    async fn save(&self, status: &WarmupStatus) -> Result<WarmupStatus> {
        let path = self.status_path(&status.pool_name)?;
        let _guard = self.write_lock.lock().await;

        let previous = self
            .read_status(&path)
            .await?
            .map(|s| s.version)
            .unwrap_or(0);

        let mut stored = status.clone();
        stored.version = previous.max(status.version) + 1;
        self.write_status(&path, &stored).await?;

        Ok(stored)
    }

    async fn update(&self, status: &WarmupStatus, expected_version: i64) -> Result<WarmupStatus> {
        let path = self.status_path(&status.pool_name)?;
        let _guard = self.write_lock.lock().await;

        let current = self
            .read_status(&path)
            .await?
            .ok_or_else(|| not_found(&status.pool_name))?;

        if current.version != expected_version {
            return Err(conflict(&status.pool_name, expected_version));
        }

        let mut stored = status.clone();
        stored.version = expected_version + 1;
        self.write_status(&path, &stored).await?;

        Ok(stored)
    }
}
