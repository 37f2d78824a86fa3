use crate::dtos::NotificationDTO;
use awaytix_domain::{Notification, NotificationType, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub notification: NotificationDTO,
}

impl NotificationResponse {
    pub fn new(notification: Notification) -> Self {
        Self {
            notification: NotificationDTO::new(notification),
        }
    }
}

pub mod notification_callback {
    use super::*;

    /// Payload the task queue posts back when a scheduled callback
    /// fires. The same shape is used when enqueuing the task.
    #[derive(Serialize, Deserialize, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub ticket_id: ID,
        pub notification_type: NotificationType,
    }

    pub type APIResponse = NotificationResponse;
}

pub mod rearm_notification {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub notification_id: ID,
    }

    pub type APIResponse = NotificationResponse;
}

pub mod process_pending {
    use super::*;

    #[derive(Deserialize, Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub processed: usize,
        pub failed: usize,
    }
}
