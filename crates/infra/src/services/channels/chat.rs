use super::INotificationChannel;
use awaytix_domain::NotificationMessage;
use serde::Serialize;

/// Posts a plain-text rendering of the message to a chat-app incoming
/// webhook (the `{"text": ...}` convention).
pub struct ChatChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl ChatChannel {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatBody {
    text: String,
}

#[async_trait::async_trait]
impl INotificationChannel for ChatChannel {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn send(&self, message: &NotificationMessage) -> anyhow::Result<()> {
        let mut text = format!("{}\n{}", message.title, message.body);
        if let Some(ticket_url) = &message.ticket_url {
            text.push('\n');
            text.push_str(ticket_url);
        }
        let res = self
            .client
            .post(&self.webhook_url)
            .json(&ChatBody { text })
            .send()
            .await?;
        if !res.status().is_success() {
            anyhow::bail!("Chat channel returned status: {}", res.status());
        }
        Ok(())
    }
}
