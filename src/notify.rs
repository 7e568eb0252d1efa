//! Team-chat notification for new claims, sent through the relay endpoint.

use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::Claim;

/// Chat payload forwarded verbatim by the relay to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimNotice {
    pub text: String,
    pub blocks: Vec<Value>,
}

impl ClaimNotice {
    pub fn for_claim(claim: &Claim, capacity: u64) -> Self {
        let text = format!(
            "New handle claimed: {} (#{} of {})",
            claim.handle, claim.position, capacity
        );
        let blocks = vec![
            json!({
                "type": "header",
                "text": { "type": "plain_text", "text": "New operator handle claimed" }
            }),
            json!({
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Handle:*\n{}", claim.handle) },
                    { "type": "mrkdwn", "text": format!("*Position:*\n#{} of {}", claim.position, capacity) },
                    { "type": "mrkdwn", "text": format!("*Name:*\n{}", claim.full_name) },
                    { "type": "mrkdwn", "text": format!("*Email:*\n{}", claim.email) }
                ]
            }),
        ];
        Self { text, blocks }
    }
}

#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, notice: &ClaimNotice) -> Result<(), StoreError>;
}

/// Posts notices to the chat relay route.
pub struct RelayNotifier {
    client: Client,
    relay_url: String,
}

impl RelayNotifier {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.into(),
        }
    }
}

impl Notifier for RelayNotifier {
    async fn notify(&self, notice: &ClaimNotice) -> Result<(), StoreError> {
        debug!("POST {} ({})", self.relay_url, notice.text);
        let response = self
            .client
            .post(&self.relay_url)
            .json(notice)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url: self.relay_url.clone(),
            });
        }
        Ok(())
    }
}
