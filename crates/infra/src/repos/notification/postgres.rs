use super::INotificationRepo;
use crate::repos::shared::repo::DeleteResult;
use awaytix_domain::{Notification, NotificationStatus, NotificationType, ID};
use sqlx::types::Uuid;
use sqlx::{FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRaw {
    notification_uid: Uuid,
    ticket_uid: Uuid,
    notification_type: String,
    scheduled_at: i64,
    sent_at: Option<i64>,
    status: String,
    error_message: Option<String>,
    external_task_id: Option<String>,
    created: i64,
    updated: i64,
}

impl TryFrom<NotificationRaw> for Notification {
    type Error = anyhow::Error;

    fn try_from(raw: NotificationRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: raw.notification_uid.into(),
            ticket_id: raw.ticket_uid.into(),
            notification_type: raw.notification_type.parse::<NotificationType>()?,
            scheduled_at: raw.scheduled_at,
            sent_at: raw.sent_at,
            status: raw.status.parse::<NotificationStatus>()?,
            error_message: raw.error_message,
            external_task_id: raw.external_task_id,
            created: raw.created,
            updated: raw.updated,
        })
    }
}

fn into_notifications(rows: Vec<NotificationRaw>) -> Vec<Notification> {
    rows.into_iter()
        .filter_map(|raw| match Notification::try_from(raw) {
            Ok(notification) => Some(notification),
            Err(e) => {
                error!("Unable to convert stored notification row. Err: {:?}", e);
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl INotificationRepo for PostgresNotificationRepo {
    async fn insert(&self, notification: &Notification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications
            (notification_uid, ticket_uid, notification_type, scheduled_at, sent_at,
             status, error_message, external_task_id, created, updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(notification.id.inner_ref())
        .bind(notification.ticket_id.inner_ref())
        .bind(notification.notification_type.as_str())
        .bind(notification.scheduled_at)
        .bind(notification.sent_at)
        .bind(notification.status.as_str())
        .bind(&notification.error_message)
        .bind(&notification.external_task_id)
        .bind(notification.created)
        .bind(notification.updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, notification: &Notification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE notifications SET
                scheduled_at = $2,
                sent_at = $3,
                status = $4,
                error_message = $5,
                external_task_id = $6,
                updated = $7
            WHERE notification_uid = $1
            "#,
        )
        .bind(notification.id.inner_ref())
        .bind(notification.scheduled_at)
        .bind(notification.sent_at)
        .bind(notification.status.as_str())
        .bind(&notification.error_message)
        .bind(&notification.external_task_id)
        .bind(notification.updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, notification_id: &ID) -> Option<Notification> {
        let raw: Option<NotificationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM notifications AS n
            WHERE n.notification_uid = $1
            "#,
        )
        .bind(notification_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()?;

        raw.and_then(|raw| Notification::try_from(raw).ok())
    }

    async fn find_by_ticket(&self, ticket_id: &ID) -> Vec<Notification> {
        let rows: Vec<NotificationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM notifications AS n
            WHERE n.ticket_uid = $1
            "#,
        )
        .bind(ticket_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();

        into_notifications(rows)
    }

    async fn find_active_by_ticket_and_type(
        &self,
        ticket_id: &ID,
        notification_type: NotificationType,
    ) -> Option<Notification> {
        let raw: Option<NotificationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM notifications AS n
            WHERE n.ticket_uid = $1 AND n.notification_type = $2 AND n.status != 'cancelled'
            "#,
        )
        .bind(ticket_id.inner_ref())
        .bind(notification_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .ok()?;

        raw.and_then(|raw| Notification::try_from(raw).ok())
    }

    async fn find_due_scheduled(&self, before: i64) -> Vec<Notification> {
        let rows: Vec<NotificationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM notifications AS n
            WHERE n.status = 'scheduled' AND n.scheduled_at <= $1
            "#,
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();

        into_notifications(rows)
    }

    async fn delete_by_ticket(&self, ticket_id: &ID) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            DELETE FROM notifications AS n
            WHERE n.ticket_uid = $1
            "#,
        )
        .bind(ticket_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }
}
