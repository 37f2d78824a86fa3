mod chat;
mod webhook;

use awaytix_domain::NotificationMessage;
pub use chat::ChatChannel;
pub use webhook::WebhookChannel;

/// A concrete delivery mechanism for a formatted notification. Channels
/// either succeed or fail as a whole; delivery treats a failing channel
/// as a failed attempt.
#[async_trait::async_trait]
pub trait INotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, message: &NotificationMessage) -> anyhow::Result<()>;
}
