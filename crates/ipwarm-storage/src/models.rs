//! Storage models

use chrono::{DateTime, Utc};
use ipwarm_common::types::PoolName;
use ipwarm_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;

/// Warm-up progress of one dedicated IP pool.
///
/// `warmup_day` is 0 before the first send and `1..=N` afterwards, where N
/// is the number of days in the schedule. Once `completed` is set the record
/// is never changed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupStatus {
    pub pool_name: PoolName,
    pub ip_addresses: BTreeSet<String>,
    pub warmup_day: u32,
    pub emails_sent_last_day: u64,
    pub date_last_sent: Option<DateTime<Utc>>,
    pub completed: bool,
    /// Optimistic-concurrency version, bumped by the store on every write
    #[serde(default)]
    pub version: i64,
}

impl WarmupStatus {
    /// Fresh, not-yet-started status for a newly prepared pool
    pub fn new<I, S>(pool_name: impl Into<PoolName>, ip_addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pool_name: pool_name.into(),
            ip_addresses: ip_addresses.into_iter().map(Into::into).collect(),
            warmup_day: 0,
            emails_sent_last_day: 0,
            date_last_sent: None,
            completed: false,
            version: 0,
        }
    }
}

/// `warmup_status` table row
#[derive(Debug, Clone, FromRow)]
pub struct WarmupStatusRow {
    pub pool_name: String,
    pub ip_addresses: Vec<String>,
    pub warmup_day: i32,
    pub emails_sent_last_day: i64,
    pub date_last_sent: Option<DateTime<Utc>>,
    pub completed: bool,
    pub version: i64,
}

impl TryFrom<WarmupStatusRow> for WarmupStatus {
    type Error = Error;

    fn try_from(row: WarmupStatusRow) -> Result<Self> {
        let warmup_day = u32::try_from(row.warmup_day).map_err(|_| {
            Error::Database(format!(
                "Invalid warmup_day {} for pool {}",
                row.warmup_day, row.pool_name
            ))
        })?;
        let emails_sent_last_day = u64::try_from(row.emails_sent_last_day).map_err(|_| {
            Error::Database(format!(
                "Invalid emails_sent_last_day {} for pool {}",
                row.emails_sent_last_day, row.pool_name
            ))
        })?;

        Ok(Self {
            pool_name: row.pool_name,
            ip_addresses: row.ip_addresses.into_iter().collect(),
            warmup_day,
            emails_sent_last_day,
            date_last_sent: row.date_last_sent,
            completed: row.completed,
            version: row.version,
        })
    }
}

impl TryFrom<&WarmupStatus> for WarmupStatusRow {
    type Error = Error;

    fn try_from(status: &WarmupStatus) -> Result<Self> {
        let warmup_day = i32::try_from(status.warmup_day)
            .map_err(|_| Error::Validation(format!("warmup_day {} out of range", status.warmup_day)))?;
        let emails_sent_last_day = i64::try_from(status.emails_sent_last_day).map_err(|_| {
            Error::Validation(format!(
                "emails_sent_last_day {} out of range",
                status.emails_sent_last_day
            ))
        })?;

        Ok(Self {
            pool_name: status.pool_name.clone(),
            ip_addresses: status.ip_addresses.iter().cloned().collect(),
            warmup_day,
            emails_sent_last_day,
            date_last_sent: status.date_last_sent,
            completed: status.completed,
            version: status.version,
        })
    }
}
