//! Recording fakes for engine tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ipwarm_common::types::{MailAddress, MessageAttributes, MessageId, Personalization};
use ipwarm_common::{Error, FixedClock, Result};
use ipwarm_core::{IpProvisioner, MailTransport, WarmupEngine, WarmupSettings};
use ipwarm_storage::{InMemoryWarmupStatusRepository, WarmupStatus, WarmupStatusRepository};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ===== RecordingTransport =====

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub pool: Option<String>,
    pub recipients: Vec<String>,
}

#[derive(Default)]
pub struct RecordingTransport {
    dispatches: Mutex<Vec<Dispatch>>,
    next_id: AtomicUsize,
    pub fail_on_pool: AtomicBool,
    pub fail_default: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatches(&self) -> Vec<Dispatch> {
        self.dispatches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(
        &self,
        personalizations: &[Personalization],
        _attributes: &MessageAttributes,
        ip_pool_name: Option<&str>,
    ) -> Result<MessageId> {
        let failing = match ip_pool_name {
            Some(_) => self.fail_on_pool.load(Ordering::SeqCst),
            None => self.fail_default.load(Ordering::SeqCst),
        };
        if failing {
            return Err(Error::Transport("503 Service Unavailable".to_string()));
        }

        self.dispatches.lock().unwrap().push(Dispatch {
            pool: ip_pool_name.map(str::to_string),
            recipients: personalizations
                .iter()
                .flat_map(|p| p.to.iter().map(|a| a.email.clone()))
                .collect(),
        });

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("msg-{}", id))
    }
}

// ===== RecordingProvisioner =====

#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionerCall {
    Allocate {
        count: u32,
        subusers: Vec<String>,
        provider_warmup: bool,
    },
    CreatePool(String),
    AddToPool(String, String),
    DeletePool(String),
}

#[derive(Default)]
pub struct RecordingProvisioner {
    calls: Mutex<Vec<ProvisionerCall>>,
    addresses: Vec<String>,
    pub fail_delete: AtomicBool,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::with_addresses(&["192.0.2.10", "192.0.2.11"])
    }

    pub fn with_addresses(addresses: &[&str]) -> Self {
        Self {
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ProvisionerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn delete_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ProvisionerCall::DeletePool(_)))
            .count()
    }
}

#[async_trait]
impl IpProvisioner for RecordingProvisioner {
    async fn allocate(
        &self,
        count: u32,
        subusers: &[String],
        provider_warmup: bool,
    ) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(ProvisionerCall::Allocate {
            count,
            subusers: subusers.to_vec(),
            provider_warmup,
        });
        Ok(self.addresses.iter().take(count as usize).cloned().collect())
    }

    async fn create_pool(&self, name: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(ProvisionerCall::CreatePool(name.to_string()));
        Ok(name.to_string())
    }

    async fn add_to_pool(&self, pool_name: &str, address: &str) -> Result<()> {
        self.calls.lock().unwrap().push(ProvisionerCall::AddToPool(
            pool_name.to_string(),
            address.to_string(),
        ));
        Ok(())
    }

    async fn delete_pool(&self, pool_name: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::Provisioner("500 Internal Server Error".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(ProvisionerCall::DeletePool(pool_name.to_string()));
        Ok(())
    }
}

// ===== RacingRepository =====

/// Simulates another writer landing between this send's read and its write
pub struct RacingRepository {
    pub inner: InMemoryWarmupStatusRepository,
}

#[async_trait]
impl WarmupStatusRepository for RacingRepository {
    async fn get(&self, pool_name: &str) -> Result<Option<WarmupStatus>> {
        let read = self.inner.get(pool_name).await?;
        if let Some(status) = &read {
            self.inner.save(status).await?;
        }
        Ok(read)
    }

    async fn save(&self, status: &WarmupStatus) -> Result<WarmupStatus> {
        self.inner.save(status).await
    }

    async fn update(&self, status: &WarmupStatus, expected_version: i64) -> Result<WarmupStatus> {
        self.inner.update(status, expected_version).await
    }
}

// ===== Fixture =====

pub const POOL: &str = "mypool";

pub fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
}

pub struct Fixture {
    pub engine: WarmupEngine,
    pub repository: InMemoryWarmupStatusRepository,
    pub transport: Arc<RecordingTransport>,
    pub provisioner: Arc<RecordingProvisioner>,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new(volumes: Vec<u64>) -> Self {
        Self::with_reset_days(volumes, 1)
    }

    pub fn with_reset_days(volumes: Vec<u64>, reset_days: u32) -> Self {
        let settings = WarmupSettings::new(POOL, volumes, reset_days).unwrap();
        let repository = InMemoryWarmupStatusRepository::new();
        let transport = Arc::new(RecordingTransport::new());
        let provisioner = Arc::new(RecordingProvisioner::new());
        let clock = Arc::new(FixedClock::new(today()));

        let engine = WarmupEngine::new(
            settings,
            Arc::new(repository.clone()),
            provisioner.clone(),
            transport.clone(),
        )
        .with_clock(clock.clone());

        Self {
            engine,
            repository,
            transport,
            provisioner,
            clock,
        }
    }

    /// Store a status for the pool with two IP addresses
    pub async fn seed(
        &self,
        day: u32,
        sent: u64,
        last_sent: Option<DateTime<Utc>>,
    ) -> WarmupStatus {
        let mut status = WarmupStatus::new(POOL, ["192.0.2.10", "192.0.2.11"]);
        status.warmup_day = day;
        status.emails_sent_last_day = sent;
        status.date_last_sent = last_sent;
        self.repository.save(&status).await.unwrap()
    }

    pub async fn stored(&self) -> WarmupStatus {
        self.repository.get(POOL).await.unwrap().unwrap()
    }
}

pub fn personalizations(count: usize) -> Vec<Personalization> {
    (1..=count)
        .map(|i| Personalization::to(MailAddress::new(format!("user{}@example.com", i))))
        .collect()
}

pub fn attributes() -> MessageAttributes {
    MessageAttributes::new(MailAddress::new("news@example.com"), "Warm-up test")
        .with_text("Hello")
}
