use crate::error::AwaytixError;
use crate::shared::usecase::UseCase;
use awaytix_domain::{Notification, NotificationEvent, ID};
use awaytix_infra::Context;
use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

/// Reverses scheduled work for a ticket: dequeues every active
/// notification's task from the external queue and marks the row
/// cancelled. Like scheduling, this attempts every notification and
/// aggregates failures instead of stopping at the first one.
///
/// A notification whose dequeue fails stays in its current state so
/// the caller can retry the whole batch.
#[derive(Debug)]
pub struct CancelNotificationsUseCase {
    pub ticket_id: ID,
}

#[derive(Debug, Error, PartialEq)]
pub enum UseCaseError {
    #[error("{failed} out of {total} notifications failed to cancel")]
    PartialFailure { failed: usize, total: usize },
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        Self::Conflict(e.to_string())
    }
}

async fn cancel_notification(
    notification: Notification,
    now: i64,
    ctx: &Context,
) -> anyhow::Result<Notification> {
    if let Some(external_task_id) = &notification.external_task_id {
        // Failure propagates: the row is only marked cancelled once the
        // queue no longer holds the task
        ctx.task_queue.dequeue(external_task_id).await?;
    }
    let cancelled = notification.transition(NotificationEvent::Cancel { at: now })?;
    ctx.repos.notifications.save(&cancelled).await?;
    Ok(cancelled)
}

#[async_trait::async_trait(?Send)]
impl UseCase for CancelNotificationsUseCase {
    type Response = Vec<Notification>;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelNotifications";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let to_cancel = ctx
            .repos
            .notifications
            .find_by_ticket(&self.ticket_id)
            .await
            .into_iter()
            // Sent notifications are history, not pending work
            .filter(|n| n.is_active() && n.sent_at.is_none())
            .collect::<Vec<_>>();

        let results = join_all(
            to_cancel
                .into_iter()
                .map(|notification| cancel_notification(notification, now, ctx)),
        )
        .await;

        let total = results.len();
        let mut cancelled = Vec::with_capacity(total);
        let mut failed = 0;
        for result in results {
            match result {
                Ok(notification) => cancelled.push(notification),
                Err(e) => {
                    failed += 1;
                    warn!(
                        "Unable to cancel a notification for ticket {}. Err: {:?}",
                        self.ticket_id, e
                    );
                }
            }
        }

        if failed > 0 {
            return Err(UseCaseError::PartialFailure { failed, total });
        }

        Ok(cancelled)
    }
}
