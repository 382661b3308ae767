//! ipwarm Core - IP warm-up scheduling engine
//!
//! This crate decides, for every outbound send, how many personalizations
//! go out through the dedicated warm-up IP pool and how many overflow to
//! normal sending infrastructure, and keeps the per-pool warm-up day
//! moving forward.

pub mod provider;
pub mod provisioner;
pub mod transport;
pub mod warmup;

pub use provider::ProviderClient;
pub use provisioner::{HttpIpProvisioner, IpProvisioner};
pub use transport::{HttpMailTransport, MailTransport};
pub use warmup::{WarmupEngine, WarmupPhase, WarmupResult, WarmupSettings};
