use awaytix_domain::{Notification, NotificationStatus, NotificationType, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDTO {
    pub id: ID,
    pub ticket_id: ID,
    pub notification_type: NotificationType,
    pub scheduled_at: i64,
    pub sent_at: Option<i64>,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub external_task_id: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl NotificationDTO {
    pub fn new(notification: Notification) -> Self {
        Self {
            id: notification.id.clone(),
            ticket_id: notification.ticket_id.clone(),
            notification_type: notification.notification_type,
            scheduled_at: notification.scheduled_at,
            sent_at: notification.sent_at,
            status: notification.status,
            error_message: notification.error_message,
            external_task_id: notification.external_task_id,
            created: notification.created,
            updated: notification.updated,
        }
    }
}
