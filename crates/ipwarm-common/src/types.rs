//! Common types for ipwarm

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of a dedicated IP pool
pub type PoolName = String;

/// Provider-assigned message identifier
pub type MessageId = String;

/// Email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailAddress {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MailAddress {
    /// Create a new address without display name
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Create a new address with a display name
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

impl std::fmt::Display for MailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

/// One addressed variant of a message.
///
/// Each personalization counts as exactly one unit against the daily
/// warm-up quota, however many recipients it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personalization {
    pub to: Vec<MailAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<MailAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<MailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub substitutions: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_args: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_at: Option<i64>,
}

impl Personalization {
    /// Single-recipient personalization
    pub fn to(recipient: MailAddress) -> Self {
        Self {
            to: vec![recipient],
            ..Default::default()
        }
    }
}

/// Message body part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

impl MailContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content_type: "text/plain".to_string(),
            value: value.into(),
        }
    }

    pub fn html(value: impl Into<String>) -> Self {
        Self {
            content_type: "text/html".to_string(),
            value: value.into(),
        }
    }
}

/// Message attributes shared by every personalization of a send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAttributes {
    pub from: MailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MailAddress>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<MailContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_args: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl MessageAttributes {
    /// Attributes with a sender, a subject and no body yet
    pub fn new(from: MailAddress, subject: impl Into<String>) -> Self {
        Self {
            from,
            reply_to: None,
            subject: subject.into(),
            content: Vec::new(),
            template_id: None,
            headers: HashMap::new(),
            categories: Vec::new(),
            custom_args: HashMap::new(),
            send_at: None,
            batch_id: None,
        }
    }

    /// Add a text/plain body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(MailContent::text(text));
        self
    }

    /// Add a text/html body
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.content.push(MailContent::html(html));
        self
    }
}
