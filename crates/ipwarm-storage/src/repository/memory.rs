//! In-memory warm-up progress repository

use super::{conflict, not_found, WarmupStatusRepository};
use crate::models::WarmupStatus;
use async_trait::async_trait;
use ipwarm_common::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local repository. Progress is lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryWarmupStatusRepository {
    statuses: Arc<RwLock<HashMap<String, WarmupStatus>>>,
}

impl InMemoryWarmupStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WarmupStatusRepository for InMemoryWarmupStatusRepository {
    async fn get(&self, pool_name: &str) -> Result<Option<WarmupStatus>> {
        Ok(self.statuses.read().await.get(pool_name).cloned())
    }

    async fn save(&self, status: &WarmupStatus) -> Result<WarmupStatus> {
        let mut statuses = self.statuses.write().await;
        let previous = statuses
            .get(&status.pool_name)
            .map(|s| s.version)
            .unwrap_or(0);

        let mut stored = status.clone();
        stored.version = previous.max(status.version) + 1;
        statuses.insert(stored.pool_name.clone(), stored.clone());

        Ok(stored)
    }

    async fn update(&self, status: &WarmupStatus, expected_version: i64) -> Result<WarmupStatus> {
        let mut statuses = self.statuses.write().await;
        let current = statuses
            .get_mut(&status.pool_name)
            .ok_or_else(|| not_found(&status.pool_name))?;

        if current.version != expected_version {
            return Err(conflict(&status.pool_name, expected_version));
        }

        let mut stored = status.clone();
        stored.version = expected_version + 1;
        *current = stored.clone();

        Ok(stored)
    }
}
