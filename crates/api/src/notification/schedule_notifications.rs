use crate::error::AwaytixError;
use crate::shared::usecase::UseCase;
use awaytix_api_structs::notification_callback;
use awaytix_domain::{scheduling, Notification, NotificationTiming, Ticket};
use awaytix_infra::{Context, QueueTask};
use futures::future::join_all;
use thiserror::Error;
use tracing::{error, warn};

/// Turns the timings a ticket still needs into durable scheduled work:
/// one delayed callback in the external task queue plus one
/// `Notification` row per timing. The per-timing operations are
/// independent; every one is attempted and failures are aggregated
/// afterwards, so losing one slot never costs the others.
#[derive(Debug)]
pub struct ScheduleNotificationsUseCase {
    pub ticket: Ticket,
}

#[derive(Debug, Error, PartialEq)]
pub enum UseCaseError {
    #[error("Notification scheduling requires a configured callback base url")]
    MissingCallbackUrl,
    #[error("{failed} out of {total} notifications failed to schedule")]
    PartialFailure { failed: usize, total: usize },
    #[error("The ticket was modified while its notifications were being scheduled")]
    Conflict,
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::MissingCallbackUrl => Self::InternalError,
            UseCaseError::PartialFailure { .. } => Self::Conflict(e.to_string()),
            UseCaseError::Conflict => {
                Self::Conflict("The ticket was modified concurrently".into())
            }
        }
    }
}

async fn schedule_notification(
    ticket: &Ticket,
    timing: NotificationTiming,
    target_url: &str,
    now: i64,
    ctx: &Context,
) -> anyhow::Result<Notification> {
    let payload = notification_callback::RequestBody {
        ticket_id: ticket.id.clone(),
        notification_type: timing.notification_type,
    };
    let task = QueueTask {
        // Deterministic task id so the queue de-duplicates repeated
        // enqueues of the same slot
        task_id: format!("{}-{}", ticket.id, timing.notification_type),
        payload: serde_json::to_value(&payload)?,
        scheduled_at: timing.scheduled_at,
        target_url: target_url.to_string(),
    };
    let external_task_id = ctx.task_queue.enqueue(task).await?;

    let notification = Notification::new(
        ticket.id.clone(),
        timing.notification_type,
        timing.scheduled_at,
        now,
    )
    .with_external_task_id(external_task_id);
    ctx.repos.notifications.insert(&notification).await?;

    Ok(notification)
}

#[async_trait::async_trait(?Send)]
impl UseCase for ScheduleNotificationsUseCase {
    type Response = Vec<Notification>;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleNotifications";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let callback_base_url = ctx
            .config
            .callback_base_url
            .as_ref()
            .ok_or(UseCaseError::MissingCallbackUrl)?;
        let target_url = format!(
            "{}/api/v1/notifications/callback",
            callback_base_url.trim_end_matches('/')
        );

        let now = ctx.sys.get_timestamp_millis();
        let existing = ctx.repos.notifications.find_by_ticket(&self.ticket.id).await;
        let timings =
            scheduling::compute_required_timings(&self.ticket, &existing, ctx.config.timezone, now);

        let results = join_all(
            timings
                .iter()
                .map(|timing| schedule_notification(&self.ticket, *timing, &target_url, now, ctx)),
        )
        .await;

        let total = results.len();
        let mut scheduled = Vec::with_capacity(total);
        let mut failed = 0;
        for (timing, result) in timings.iter().zip(results) {
            match result {
                Ok(notification) => scheduled.push(notification),
                Err(e) => {
                    failed += 1;
                    warn!(
                        "Unable to schedule {} notification for ticket {}. Err: {:?}",
                        timing.notification_type, self.ticket.id, e
                    );
                }
            }
        }

        if failed > 0 {
            return Err(UseCaseError::PartialFailure { failed, total });
        }

        let marked = ctx
            .repos
            .tickets
            .mark_notification_scheduled(&self.ticket.id, self.ticket.version, now)
            .await
            .map_err(|e| {
                error!(
                    "Unable to mark ticket {} as scheduled. Err: {:?}",
                    self.ticket.id, e
                );
                UseCaseError::Conflict
            })?;
        if !marked {
            // A concurrent upsert moved the ticket on; that ingestion
            // run owns rescheduling now
            return Err(UseCaseError::Conflict);
        }

        Ok(scheduled)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_helpers::{albion_ticket as ticket, march_1, setup_context_at as setup};
    use crate::shared::usecase::execute;
    use awaytix_domain::NotificationType;

    #[actix_web::test]
    async fn schedules_all_three_timings() {
        let now = march_1();
        let (ctx, queue) = setup(now);
        let ticket = ctx.repos.tickets.upsert(&ticket(now)).await.unwrap();

        let scheduled = execute(
            ScheduleNotificationsUseCase {
                ticket: ticket.clone(),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(scheduled.len(), 3);
        assert_eq!(queue.task_count(), 3);
        assert_eq!(
            ctx.repos.notifications.find_by_ticket(&ticket.id).await.len(),
            3
        );
        assert!(ctx
            .repos
            .tickets
            .find(&ticket.id)
            .await
            .unwrap()
            .notification_scheduled);

        let tasks = queue.tasks.lock().unwrap();
        assert!(tasks
            .iter()
            .any(|(_, t)| t.task_id == format!("{}-day_before", ticket.id)));
        assert!(tasks
            .iter()
            .all(|(_, t)| t.target_url == "https://awaytix.example.com/api/v1/notifications/callback"));
    }

    #[actix_web::test]
    async fn partial_enqueue_failure_keeps_the_other_slots() {
        let now = march_1();
        let (ctx, queue) = setup(now);
        let ticket = ctx.repos.tickets.upsert(&ticket(now)).await.unwrap();
        queue
            .failing_task_ids
            .lock()
            .unwrap()
            .push(format!("{}-hour_before", ticket.id));

        let res = execute(
            ScheduleNotificationsUseCase {
                ticket: ticket.clone(),
            },
            &ctx,
        )
        .await;

        let err = res.unwrap_err();
        assert_eq!(err, UseCaseError::PartialFailure { failed: 1, total: 3 });
        assert_eq!(
            err.to_string(),
            "1 out of 3 notifications failed to schedule"
        );

        // The two successful slots are durable
        assert_eq!(queue.task_count(), 2);
        let stored = ctx.repos.notifications.find_by_ticket(&ticket.id).await;
        assert_eq!(stored.len(), 2);
        assert!(stored
            .iter()
            .all(|n| n.notification_type != NotificationType::HourBefore));
        // The ticket stays unscheduled so a retry can fill the gap
        assert!(!ctx
            .repos
            .tickets
            .find(&ticket.id)
            .await
            .unwrap()
            .notification_scheduled);
    }

    #[actix_web::test]
    async fn retry_after_partial_failure_only_fills_the_gap() {
        let now = march_1();
        let (ctx, queue) = setup(now);
        let ticket = ctx.repos.tickets.upsert(&ticket(now)).await.unwrap();
        queue
            .failing_task_ids
            .lock()
            .unwrap()
            .push(format!("{}-hour_before", ticket.id));

        assert!(execute(
            ScheduleNotificationsUseCase {
                ticket: ticket.clone(),
            },
            &ctx,
        )
        .await
        .is_err());

        queue.failing_task_ids.lock().unwrap().clear();
        let scheduled = execute(
            ScheduleNotificationsUseCase {
                ticket: ticket.clone(),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(scheduled.len(), 1);
        assert_eq!(
            scheduled[0].notification_type,
            NotificationType::HourBefore
        );
        assert_eq!(
            ctx.repos.notifications.find_by_ticket(&ticket.id).await.len(),
            3
        );
    }

    #[actix_web::test]
    async fn fails_fast_without_a_callback_url() {
        let now = march_1();
        let (mut ctx, queue) = setup(now);
        ctx.config.callback_base_url = None;
        let ticket = ctx.repos.tickets.upsert(&ticket(now)).await.unwrap();

        let res = execute(ScheduleNotificationsUseCase { ticket }, &ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::MissingCallbackUrl);
        assert_eq!(queue.task_count(), 0);
    }

    #[actix_web::test]
    async fn concurrent_ticket_update_is_a_conflict() {
        let now = march_1();
        let (ctx, _queue) = setup(now);
        let stored = ctx.repos.tickets.upsert(&ticket(now)).await.unwrap();

        // Another ingestion run bumps the version between decide and
        // persist
        ctx.repos.tickets.upsert(&stored).await.unwrap();

        let res = execute(ScheduleNotificationsUseCase { ticket: stored }, &ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::Conflict);
    }
}
