//! Warm-up settings

use ipwarm_common::config::{WarmupConfig, RECOMMENDED_DAILY_VOLUMES};
use ipwarm_common::{Error, Result};

/// Immutable, validated warm-up configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupSettings {
    pool_name: String,
    daily_volume_per_ip_address: Vec<u64>,
    reset_days: u32,
}

impl WarmupSettings {
    /// Create settings. Fails with `Error::Config` on an empty pool name,
    /// an empty or zero-containing volume schedule, or `reset_days == 0`.
    pub fn new(
        pool_name: impl Into<String>,
        daily_volume_per_ip_address: Vec<u64>,
        reset_days: u32,
    ) -> Result<Self> {
        let pool_name = pool_name.into();

        if pool_name.trim().is_empty() {
            return Err(Error::Config("Warm-up pool name must not be empty".to_string()));
        }
        if daily_volume_per_ip_address.is_empty() {
            return Err(Error::Config(
                "Daily volume schedule must contain at least one day".to_string(),
            ));
        }
        if let Some(day) = daily_volume_per_ip_address.iter().position(|v| *v == 0) {
            return Err(Error::Config(format!(
                "Daily volume for day {} must be positive",
                day + 1
            )));
        }
        if u32::try_from(daily_volume_per_ip_address.len()).is_err() {
            return Err(Error::Config("Daily volume schedule is too long".to_string()));
        }
        if reset_days == 0 {
            return Err(Error::Config("reset_days must be at least 1".to_string()));
        }

        Ok(Self {
            pool_name,
            daily_volume_per_ip_address,
            reset_days,
        })
    }

    /// Provider-recommended 17-day schedule with a one-day grace period
    pub fn recommended(pool_name: impl Into<String>) -> Result<Self> {
        Self::new(pool_name, RECOMMENDED_DAILY_VOLUMES.to_vec(), 1)
    }

    /// Build settings from the `[warmup]` config section
    pub fn from_config(config: &WarmupConfig) -> Result<Self> {
        Self::new(
            config.pool_name.clone(),
            config.daily_volume_per_ip_address.clone(),
            config.reset_days,
        )
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn daily_volume_per_ip_address(&self) -> &[u64] {
        &self.daily_volume_per_ip_address
    }

    pub fn reset_days(&self) -> u32 {
        self.reset_days
    }

    /// Number of warm-up days (N)
    pub fn total_days(&self) -> u32 {
        // length checked in `new`
        self.daily_volume_per_ip_address.len() as u32
    }

    /// Per-IP cap for a 1-based warm-up day
    pub fn daily_volume(&self, day: u32) -> Option<u64> {
        let index = usize::try_from(day.checked_sub(1)?).ok()?;
        self.daily_volume_per_ip_address.get(index).copied()
    }

    /// Pool-wide cap for a warm-up day with `ip_count` addresses
    pub fn capacity(&self, day: u32, ip_count: usize) -> Result<u64> {
        if ip_count == 0 {
            return Err(Error::Config(format!(
                "Pool '{}' has no IP addresses assigned",
                self.pool_name
            )));
        }

        let per_ip = self.daily_volume(day).ok_or_else(|| {
            Error::Internal(format!(
                "Warm-up day {} is outside the {}-day schedule",
                day,
                self.total_days()
            ))
        })?;

        Ok(per_ip.saturating_mul(ip_count as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_settings() {
        let settings = WarmupSettings::new("mypool", vec![3, 6, 9, 12], 1).unwrap();
        assert_eq!(settings.pool_name(), "mypool");
        assert_eq!(settings.total_days(), 4);
        assert_eq!(settings.daily_volume(1), Some(3));
        assert_eq!(settings.daily_volume(4), Some(12));
        assert_eq!(settings.daily_volume(0), None);
        assert_eq!(settings.daily_volume(5), None);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            WarmupSettings::new("mypool", vec![], 1),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WarmupSettings::new("mypool", vec![2, 0, 4], 1),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WarmupSettings::new("mypool", vec![2, 4], 0),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WarmupSettings::new("  ", vec![2, 4], 1),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_capacity() {
        let settings = WarmupSettings::new("mypool", vec![3, 6, 9, 12], 1).unwrap();
        assert_eq!(settings.capacity(1, 2).unwrap(), 6);
        assert_eq!(settings.capacity(4, 2).unwrap(), 24);
        assert!(matches!(settings.capacity(1, 0), Err(Error::Config(_))));
        assert!(settings.capacity(0, 2).is_err());
    }

    #[test]
    fn test_recommended_schedule() {
        let settings = WarmupSettings::recommended("warmup").unwrap();
        assert_eq!(settings.total_days(), 17);
        assert_eq!(settings.daily_volume(1), Some(50));
        assert_eq!(settings.daily_volume(17), Some(4_000_000));
        assert_eq!(settings.reset_days(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = WarmupConfig {
            pool_name: "cfgpool".to_string(),
            daily_volume_per_ip_address: vec![2, 4, 6, 8, 10],
            reset_days: 3,
        };
        let settings = WarmupSettings::from_config(&config).unwrap();
        assert_eq!(settings.pool_name(), "cfgpool");
        assert_eq!(settings.reset_days(), 3);
        assert_eq!(settings.total_days(), 5);
    }
}
