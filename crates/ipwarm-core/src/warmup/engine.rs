//! Warm-up Engine - Routes sends between the warm-up pool and default sending
//!
//! Each send performs one read-modify-write of the pool's `WarmupStatus`.
//! Concurrent sends for the same pool are detected through the repository's
//! version check: the losing send fails with `Error::Conflict` and may be
//! retried as a whole. Its mail has already been dispatched by then.

use super::routing::QuotaSplit;
use super::schedule::{advance, DayTransition, WarmupPhase};
use super::settings::WarmupSettings;
use crate::provisioner::IpProvisioner;
use crate::transport::MailTransport;
use ipwarm_common::types::{MailAddress, MessageAttributes, MessageId, Personalization};
use ipwarm_common::{Clock, Error, Result, SystemClock};
use ipwarm_storage::{WarmupStatus, WarmupStatusRepository};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmupResult {
    /// Whether warm-up is complete after this send
    pub completed: bool,
    /// Message id of the part sent through the warm-up pool
    pub message_id_on_pool: Option<MessageId>,
    /// Message id of the part sent through default infrastructure
    pub message_id_not_on_pool: Option<MessageId>,
}

/// IP warm-up engine
pub struct WarmupEngine {
    settings: WarmupSettings,
    repository: Arc<dyn WarmupStatusRepository>,
    provisioner: Arc<dyn IpProvisioner>,
    transport: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
}

/// Race a collaborator call against cancellation
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}

impl WarmupEngine {
    /// Create a new engine using the system clock
    pub fn new(
        settings: WarmupSettings,
        repository: Arc<dyn WarmupStatusRepository>,
        provisioner: Arc<dyn IpProvisioner>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            settings,
            repository,
            provisioner,
            transport,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Schedule this engine enforces
    pub fn settings(&self) -> &WarmupSettings {
        &self.settings
    }

    /// Allocate `count` new dedicated addresses, put them in the warm-up pool
    /// and reset the pool's progress.
    pub async fn prepare_with_new_ip_addresses(
        &self,
        count: u32,
        subusers: &[String],
        cancel: &CancellationToken,
    ) -> Result<WarmupStatus> {
        if count == 0 {
            return Err(Error::Validation(
                "At least one IP address must be requested".to_string(),
            ));
        }

        let addresses =
            cancellable(cancel, self.provisioner.allocate(count, subusers, false)).await?;
        if addresses.is_empty() {
            return Err(Error::Provisioner(
                "Provider allocated no IP addresses".to_string(),
            ));
        }

        self.prepare_pool(addresses, cancel).await
    }

    /// Warm up addresses the account already owns
    pub async fn prepare_with_existing_ip_addresses(
        &self,
        addresses: &[String],
        cancel: &CancellationToken,
    ) -> Result<WarmupStatus> {
        if addresses.is_empty() {
            return Err(Error::Config(
                "At least one IP address is required for warm-up".to_string(),
            ));
        }

        self.prepare_pool(addresses.to_vec(), cancel).await
    }

    async fn prepare_pool(
        &self,
        addresses: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<WarmupStatus> {
        let pool_name = self.settings.pool_name();

        cancellable(cancel, self.provisioner.create_pool(pool_name)).await?;
        for address in &addresses {
            cancellable(cancel, self.provisioner.add_to_pool(pool_name, address)).await?;
        }

        let status = WarmupStatus::new(pool_name, addresses);
        let stored = cancellable(cancel, self.repository.save(&status)).await?;

        info!(
            pool = %pool_name,
            ip_count = stored.ip_addresses.len(),
            days = self.settings.total_days(),
            "Prepared IP pool for warm-up"
        );

        Ok(stored)
    }

    /// Current progress of the warm-up pool
    pub async fn status(&self, cancel: &CancellationToken) -> Result<WarmupStatus> {
        self.load_status(cancel).await
    }

    /// Lifecycle phase of a stored status under this engine's schedule
    pub fn phase(&self, status: &WarmupStatus) -> WarmupPhase {
        WarmupPhase::of(status, &self.settings)
    }

    async fn load_status(&self, cancel: &CancellationToken) -> Result<WarmupStatus> {
        let pool_name = self.settings.pool_name();
        cancellable(cancel, self.repository.get(pool_name))
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No warm-up status for pool '{}'; prepare the pool first",
                    pool_name
                ))
            })
    }

    /// Send one message to a single recipient
    pub async fn send_to_single_recipient(
        &self,
        recipient: MailAddress,
        attributes: &MessageAttributes,
        cancel: &CancellationToken,
    ) -> Result<WarmupResult> {
        self.send(&[Personalization::to(recipient)], attributes, cancel)
            .await
    }

    /// Send a message, routing as many leading personalizations through the
    /// warm-up pool as today's quota allows and the rest through default
    /// infrastructure.
    ///
    /// If the pool-bound dispatch fails nothing is persisted. If it succeeds
    /// and the overflow dispatch fails, the pool progress is persisted and
    /// `Error::PartialDelivery` is returned. When the final day's quota is met
    /// the status is persisted as completed even if deleting the pool fails;
    /// that failure is returned as `Error::PoolTeardown`.
    pub async fn send(
        &self,
        personalizations: &[Personalization],
        attributes: &MessageAttributes,
        cancel: &CancellationToken,
    ) -> Result<WarmupResult> {
        let pool_name = self.settings.pool_name();
        let loaded = self.load_status(cancel).await?;

        if personalizations.is_empty() {
            return Ok(WarmupResult {
                completed: loaded.completed,
                ..Default::default()
            });
        }

        if WarmupPhase::of(&loaded, &self.settings) == WarmupPhase::Completed {
            // Pool is retired, everything goes through default sending
            let message_id = cancellable(
                cancel,
                self.transport.send(personalizations, attributes, None),
            )
            .await?;
            return Ok(WarmupResult {
                completed: true,
                message_id_on_pool: None,
                message_id_not_on_pool: Some(message_id),
            });
        }

        let now = self.clock.now();
        let progress = advance(&loaded, &self.settings, now);
        let capacity = self
            .settings
            .capacity(progress.warmup_day, loaded.ip_addresses.len())?;
        let split = QuotaSplit::compute(capacity, progress.emails_sent, personalizations.len());
        let (on_pool, overflow) = personalizations.split_at(split.on_pool);

        if progress.transition != DayTransition::SameDay {
            info!(
                pool = %pool_name,
                warmup_day = progress.warmup_day,
                transition = ?progress.transition,
                capacity,
                "Warm-up day rolled over"
            );
        }
        debug!(
            pool = %pool_name,
            warmup_day = progress.warmup_day,
            remaining = split.remaining,
            on_pool = split.on_pool,
            overflow = split.overflow,
            "Routing send"
        );

        let mut result = WarmupResult::default();

        if !on_pool.is_empty() {
            let message_id = cancellable(
                cancel,
                self.transport.send(on_pool, attributes, Some(pool_name)),
            )
            .await?;
            result.message_id_on_pool = Some(message_id);
        }

        let mut overflow_failure = None;
        if !overflow.is_empty() {
            match cancellable(cancel, self.transport.send(overflow, attributes, None)).await {
                Ok(message_id) => result.message_id_not_on_pool = Some(message_id),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) if result.message_id_on_pool.is_some() => overflow_failure = Some(e),
                // Nothing went out, nothing to record
                Err(e) => return Err(e),
            }
        }

        let mut status = loaded.clone();
        status.warmup_day = progress.warmup_day;
        status.emails_sent_last_day = progress.emails_sent + on_pool.len() as u64;
        status.date_last_sent = Some(now);

        let last_day = progress.warmup_day == self.settings.total_days();
        let mut teardown_failure = None;
        if last_day && split.saturates(progress.emails_sent) {
            // Completion is recorded even if the pool outlives it
            status.completed = true;
            match cancellable(cancel, self.provisioner.delete_pool(pool_name)).await {
                Ok(()) => info!(pool = %pool_name, "IP warm-up completed"),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => teardown_failure = Some(e),
            }
        }

        let stored =
            match cancellable(cancel, self.repository.update(&status, loaded.version)).await {
                Ok(stored) => stored,
                Err(e @ Error::Conflict { .. }) => {
                    warn!(pool = %pool_name, "Warm-up status changed during send");
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
        result.completed = stored.completed;

        if let Some(source) = overflow_failure {
            warn!(
                pool = %pool_name,
                error = %source,
                "Overflow dispatch failed after pool dispatch"
            );
            if let Some(teardown) = &teardown_failure {
                warn!(
                    pool = %pool_name,
                    error = %teardown,
                    "Failed to delete completed warm-up pool"
                );
            }
            return Err(Error::PartialDelivery {
                message_id_on_pool: result.message_id_on_pool.unwrap_or_default(),
                source: Box::new(source),
            });
        }

        if let Some(source) = teardown_failure {
            warn!(
                pool = %pool_name,
                error = %source,
                "Failed to delete completed warm-up pool"
            );
            return Err(Error::PoolTeardown {
                pool_name: pool_name.to_string(),
                message_id_on_pool: result.message_id_on_pool,
                message_id_not_on_pool: result.message_id_not_on_pool,
                source: Box::new(source),
            });
        }

        Ok(result)
    }
}
