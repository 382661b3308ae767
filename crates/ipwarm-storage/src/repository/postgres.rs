//! PostgreSQL warm-up progress repository

use super::{conflict, not_found, WarmupStatusRepository};
use crate::db::DatabasePool;
use crate::models::{WarmupStatus, WarmupStatusRow};
use async_trait::async_trait;
use ipwarm_common::{Error, Result};

/// Database warm-up progress repository
pub struct DbWarmupStatusRepository {
    pool: DatabasePool,
}

impl DbWarmupStatusRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarmupStatusRepository for DbWarmupStatusRepository {
    async fn get(&self, pool_name: &str) -> Result<Option<WarmupStatus>> {
        let row = sqlx::query_as::<_, WarmupStatusRow>(
            r#"
            SELECT pool_name, ip_addresses, warmup_day, emails_sent_last_day,
                   date_last_sent, completed, version
            FROM warmup_status
            WHERE pool_name = $1
            "#,
        )
        .bind(pool_name)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        row.map(WarmupStatus::try_from).transpose()
    }

    async fn save(&self, status: &WarmupStatus) -> Result<WarmupStatus> {
        let row = WarmupStatusRow::try_from(status)?;

        let stored = sqlx::query_as::<_, WarmupStatusRow>(
            r#"
            INSERT INTO warmup_status (
                pool_name, ip_addresses, warmup_day, emails_sent_last_day,
                date_last_sent, completed, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7 + 1, NOW(), NOW())
            ON CONFLICT (pool_name) DO UPDATE SET
                ip_addresses = EXCLUDED.ip_addresses,
                warmup_day = EXCLUDED.warmup_day,
                emails_sent_last_day = EXCLUDED.emails_sent_last_day,
                date_last_sent = EXCLUDED.date_last_sent,
                completed = EXCLUDED.completed,
                version = GREATEST(warmup_status.version, $7) + 1,
                updated_at = NOW()
            RETURNING pool_name, ip_addresses, warmup_day, emails_sent_last_day,
                      date_last_sent, completed, version
            "#,
        )
        .bind(&row.pool_name)
        .bind(&row.ip_addresses)
        .bind(row.warmup_day)
        .bind(row.emails_sent_last_day)
        .bind(row.date_last_sent)
        .bind(row.completed)
        .bind(row.version)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        WarmupStatus::try_from(stored)
    }

    async fn update(&self, status: &WarmupStatus, expected_version: i64) -> Result<WarmupStatus> {
        let row = WarmupStatusRow::try_from(status)?;

        let stored = sqlx::query_as::<_, WarmupStatusRow>(
            r#"
            UPDATE warmup_status SET
                ip_addresses = $2,
                warmup_day = $3,
                emails_sent_last_day = $4,
                date_last_sent = $5,
                completed = $6,
                version = version + 1,
                updated_at = NOW()
            WHERE pool_name = $1 AND version = $7
            RETURNING pool_name, ip_addresses, warmup_day, emails_sent_last_day,
                      date_last_sent, completed, version
            "#,
        )
        .bind(&row.pool_name)
        .bind(&row.ip_addresses)
        .bind(row.warmup_day)
        .bind(row.emails_sent_last_day)
        .bind(row.date_last_sent)
        .bind(row.completed)
        .bind(expected_version)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        match stored {
            Some(stored) => WarmupStatus::try_from(stored),
            // Either the row is gone or somebody else bumped the version
            None => match self.get(&status.pool_name).await? {
                Some(_) => Err(conflict(&status.pool_name, expected_version)),
                None => Err(not_found(&status.pool_name)),
            },
        }
    }
}
