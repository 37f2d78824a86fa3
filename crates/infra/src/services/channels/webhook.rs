use super::INotificationChannel;
use crate::config::WebhookChannelConfig;
use awaytix_domain::NotificationMessage;

const WEBHOOK_KEY_HEADER: &str = "awaytix-webhook-key";

/// Posts the message as JSON to a subscriber-owned endpoint, signed
/// with the shared webhook key so the receiver can verify the origin.
pub struct WebhookChannel {
    url: String,
    key: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(config: &WebhookChannelConfig) -> Self {
        Self {
            url: config.url.clone(),
            key: config.key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl INotificationChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &NotificationMessage) -> anyhow::Result<()> {
        let res = self
            .client
            .post(&self.url)
            .header(WEBHOOK_KEY_HEADER, &self.key)
            .json(message)
            .send()
            .await?;
        if !res.status().is_success() {
            anyhow::bail!("Webhook channel returned status: {}", res.status());
        }
        Ok(())
    }
}
