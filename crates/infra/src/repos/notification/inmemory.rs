use super::INotificationRepo;
use crate::repos::shared::inmemory_repo::*;
use crate::repos::shared::repo::DeleteResult;
use awaytix_domain::{Notification, NotificationType, ID};

pub struct InMemoryNotificationRepo {
    notifications: std::sync::Mutex<Vec<Notification>>,
}

impl InMemoryNotificationRepo {
    pub fn new() -> Self {
        Self {
            notifications: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl INotificationRepo for InMemoryNotificationRepo {
    async fn insert(&self, notification: &Notification) -> anyhow::Result<()> {
        insert(notification, &self.notifications);
        Ok(())
    }

    async fn save(&self, notification: &Notification) -> anyhow::Result<()> {
        save(notification, &self.notifications);
        Ok(())
    }

    async fn find(&self, notification_id: &ID) -> Option<Notification> {
        find(notification_id, &self.notifications)
    }

    async fn find_by_ticket(&self, ticket_id: &ID) -> Vec<Notification> {
        find_by(&self.notifications, |n| n.ticket_id == *ticket_id)
    }

    async fn find_active_by_ticket_and_type(
        &self,
        ticket_id: &ID,
        notification_type: NotificationType,
    ) -> Option<Notification> {
        let mut matches = find_by(&self.notifications, |n| {
            n.ticket_id == *ticket_id
                && n.notification_type == notification_type
                && n.is_active()
        });
        if matches.is_empty() {
            return None;
        }
        Some(matches.remove(0))
    }

    async fn find_due_scheduled(&self, before: i64) -> Vec<Notification> {
        find_by(&self.notifications, |n| n.can_be_sent(before, 0))
    }

    async fn delete_by_ticket(&self, ticket_id: &ID) -> anyhow::Result<DeleteResult> {
        Ok(delete_by(&self.notifications, |n| {
            n.ticket_id == *ticket_id
        }))
    }
}
