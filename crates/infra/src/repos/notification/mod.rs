mod inmemory;
mod postgres;

use crate::repos::shared::repo::DeleteResult;
use awaytix_domain::{Notification, NotificationType, ID};
pub use inmemory::InMemoryNotificationRepo;
pub use postgres::PostgresNotificationRepo;

#[async_trait::async_trait]
pub trait INotificationRepo: Send + Sync {
    async fn insert(&self, notification: &Notification) -> anyhow::Result<()>;
    async fn save(&self, notification: &Notification) -> anyhow::Result<()>;
    async fn find(&self, notification_id: &ID) -> Option<Notification>;
    async fn find_by_ticket(&self, ticket_id: &ID) -> Vec<Notification>;
    /// The one non-cancelled notification for (ticket, type), if any
    async fn find_active_by_ticket_and_type(
        &self,
        ticket_id: &ID,
        notification_type: NotificationType,
    ) -> Option<Notification>;
    /// Scheduled notifications whose target instant is at or before
    /// `before`; the sweep path feeds these back into delivery
    async fn find_due_scheduled(&self, before: i64) -> Vec<Notification>;
    async fn delete_by_ticket(&self, ticket_id: &ID) -> anyhow::Result<DeleteResult>;
}
