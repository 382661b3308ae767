//! IP Provisioner - Dedicated IP allocation and pool management

mod http;

pub use http::HttpIpProvisioner;

use async_trait::async_trait;
use ipwarm_common::Result;

/// Allocates dedicated IP addresses and manages named pools of them
#[async_trait]
pub trait IpProvisioner: Send + Sync {
    /// Allocate `count` new addresses, optionally scoped to subusers.
    /// `provider_warmup` toggles the provider's own warm-up; the engine
    /// always passes `false` since it owns the warm-up policy.
    async fn allocate(
        &self,
        count: u32,
        subusers: &[String],
        provider_warmup: bool,
    ) -> Result<Vec<String>>;

    /// Create a pool. Creating a pool that already exists succeeds.
    async fn create_pool(&self, name: &str) -> Result<String>;

    /// Add an address to a pool
    async fn add_to_pool(&self, pool_name: &str, address: &str) -> Result<()>;

    /// Delete a pool
    async fn delete_pool(&self, pool_name: &str) -> Result<()>;
}
