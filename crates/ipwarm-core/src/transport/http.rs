//! Provider-API backed mail transport

use super::MailTransport;
use crate::provider::ProviderClient;
use async_trait::async_trait;
use ipwarm_common::types::{MessageAttributes, MessageId, Personalization};
use ipwarm_common::{Error, Result};
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

/// Response header carrying the provider-assigned message id
pub const MESSAGE_ID_HEADER: &str = "x-message-id";

#[derive(Debug, Serialize)]
struct MailSendBody<'a> {
    personalizations: &'a [Personalization],
    #[serde(flatten)]
    attributes: &'a MessageAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_pool_name: Option<&'a str>,
}

/// Mail transport posting to the provider's `/v3/mail/send`
pub struct HttpMailTransport {
    client: ProviderClient,
}

impl HttpMailTransport {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(
        &self,
        personalizations: &[Personalization],
        attributes: &MessageAttributes,
        ip_pool_name: Option<&str>,
    ) -> Result<MessageId> {
        let body = MailSendBody {
            personalizations,
            attributes,
            ip_pool_name,
        };

        let response = self
            .client
            .request(Method::POST, &["v3", "mail", "send"])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Mail send request failed: {}", e)))?;

        let response = ProviderClient::check(response)
            .await
            .map_err(|f| Error::Transport(format!("Mail send rejected: {}", f)))?;

        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Transport("Mail send response carried no message id".to_string())
            })?;

        debug!(
            message_id = %message_id,
            personalizations = personalizations.len(),
            pool = ip_pool_name.unwrap_or("-"),
            "Mail dispatched"
        );

        Ok(message_id)
    }
}
