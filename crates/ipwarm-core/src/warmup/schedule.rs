//! Day advancement
//!
//! Decides, from the stored status and the current instant, which warm-up
//! day a send belongs to and how much of that day's quota is already used.
//! Elapsed time is measured in UTC calendar days, not 24-hour periods: a
//! send at 23:59 followed by one at 00:01 is one day apart.

use super::settings::WarmupSettings;
use chrono::{DateTime, Utc};
use ipwarm_storage::WarmupStatus;
use serde::Serialize;

/// Lifecycle phase of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupPhase {
    NotStarted,
    Warming(u32),
    LastDay,
    Completed,
}

impl WarmupPhase {
    pub fn of(status: &WarmupStatus, settings: &WarmupSettings) -> Self {
        if status.completed {
            WarmupPhase::Completed
        } else if status.warmup_day == 0 {
            WarmupPhase::NotStarted
        } else if status.warmup_day >= settings.total_days() {
            WarmupPhase::LastDay
        } else {
            WarmupPhase::Warming(status.warmup_day)
        }
    }
}

/// How the day counter moved for this send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTransition {
    /// First send ever: day 0 -> day 1
    Started,
    /// Same calendar day as the last send, quota keeps accumulating
    SameDay,
    /// Gap within the grace period, moved to the next day
    Advanced,
    /// Gap longer than the grace period, same day with a fresh quota
    Restarted,
}

/// Effective day and carried-over count for one send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    pub warmup_day: u32,
    pub emails_sent: u64,
    pub transition: DayTransition,
}

/// Whole calendar days from `last` to `now`. A clock that went backwards counts as 0.
pub fn calendar_days_between(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now.date_naive() - last.date_naive()).num_days().max(0)
}

/// Apply the day-advancement rules to a stored status
pub fn advance(status: &WarmupStatus, settings: &WarmupSettings, now: DateTime<Utc>) -> DayProgress {
    let last_day = settings.total_days();

    if status.warmup_day == 0 {
        return DayProgress {
            warmup_day: 1,
            emails_sent: 0,
            transition: DayTransition::Started,
        };
    }

    // A shortened schedule must not leave the pool beyond its last day
    let current_day = status.warmup_day.min(last_day);

    let days_since_last_send = match status.date_last_sent {
        Some(last) => calendar_days_between(last, now),
        None => i64::MAX,
    };

    if days_since_last_send == 0 {
        DayProgress {
            warmup_day: current_day,
            emails_sent: status.emails_sent_last_day,
            transition: DayTransition::SameDay,
        }
    } else if days_since_last_send <= i64::from(settings.reset_days()) {
        DayProgress {
            warmup_day: (current_day + 1).min(last_day),
            emails_sent: 0,
            transition: DayTransition::Advanced,
        }
    } else {
        DayProgress {
            warmup_day: current_day,
            emails_sent: 0,
            transition: DayTransition::Restarted,
        }
    }
}
