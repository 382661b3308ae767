//! Mail Transport - Dispatches a batch of personalizations

mod http;

pub use http::HttpMailTransport;

use async_trait::async_trait;
use ipwarm_common::types::{MessageAttributes, MessageId, Personalization};
use ipwarm_common::Result;

/// Sends one message to a batch of personalizations
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Dispatch the batch. `ip_pool_name == None` means default routing.
    async fn send(
        &self,
        personalizations: &[Personalization],
        attributes: &MessageAttributes,
        ip_pool_name: Option<&str>,
    ) -> Result<MessageId>;
}
