use crate::error::AwaytixError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::rt::time::sleep;
use actix_web::{web, HttpResponse};
use awaytix_api_structs::notification_callback::{APIResponse, RequestBody};
use awaytix_domain::{
    Notification, NotificationEvent, NotificationMessage, NotificationStatus, NotificationTiming,
    NotificationType, Ticket, ID,
};
use awaytix_infra::Context;
use futures::future::join_all;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Entry point for the external task queue: it POSTs the payload it
/// was given at enqueue time when the scheduled instant arrives.
pub async fn notification_callback_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    let body = body.0;
    let usecase = SendNotificationUseCase {
        ticket_id: body.ticket_id,
        notification_type: body.notification_type,
    };

    execute(usecase, &ctx)
        .await
        .map(|notification| HttpResponse::Ok().json(APIResponse::new(notification)))
        .map_err(AwaytixError::from)
}

/// Delivers one notification when the task queue's callback fires (or
/// when the sweep catches up a missed one).
///
/// The queue may redeliver a callback, so the whole path is idempotent:
/// the existing row for (ticket, type) is reused, an already-sent row
/// short-circuits, and a row that is no longer `scheduled` (a
/// cancellation racing the callback) aborts before anything is sent.
#[derive(Debug)]
pub struct SendNotificationUseCase {
    pub ticket_id: ID,
    pub notification_type: NotificationType,
}

#[derive(Debug, Error, PartialEq)]
pub enum UseCaseError {
    // The ticket was deleted after its notifications were scheduled.
    // Nothing to retry.
    #[error("Ticket not found: {0}")]
    TicketNotFound(ID),
    #[error("Ticket {0} has no known sale start to notify about")]
    TicketNotSchedulable(ID),
    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    DeliveryFailed { attempts: u32, last_error: String },
    #[error("Storage error")]
    StorageError,
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::TicketNotFound(ticket_id) => {
                Self::NotFound(format!("The ticket with id: {}, was not found.", ticket_id))
            }
            UseCaseError::TicketNotSchedulable(ticket_id) => Self::BadClientData(format!(
                "The ticket with id: {} has no sale start date.",
                ticket_id
            )),
            UseCaseError::DeliveryFailed { .. } => Self::InternalError,
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

/// One attempt fans out to every configured channel and only counts as
/// successful when all of them succeed; a half-delivered notification
/// is retried rather than silently accepted.
async fn attempt_delivery(message: &NotificationMessage, ctx: &Context) -> Result<(), String> {
    let results = join_all(ctx.channels.iter().map(|channel| channel.send(message))).await;

    let failures = ctx
        .channels
        .iter()
        .zip(results)
        .filter_map(|(channel, result)| {
            result
                .err()
                .map(|e| format!("{}: {}", channel.name(), e))
        })
        .collect::<Vec<_>>();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("; "))
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendNotificationUseCase {
    type Response = Notification;

    type Error = UseCaseError;

    const NAME: &'static str = "SendNotification";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let ticket = ctx
            .repos
            .tickets
            .find(&self.ticket_id)
            .await
            .ok_or_else(|| UseCaseError::TicketNotFound(self.ticket_id.clone()))?;

        let notification = self.find_or_create_notification(&ticket, ctx).await?;

        match notification.status {
            NotificationStatus::Sent => {
                // Redelivered callback, the work is already done
                return Ok(notification);
            }
            NotificationStatus::Scheduled => {}
            _ => {
                // Cancelled while the callback was in flight, or failed
                // and awaiting an explicit re-arm
                info!(
                    "Skipping delivery of {} notification for ticket {}: status is {}",
                    self.notification_type, self.ticket_id, notification.status
                );
                return Ok(notification);
            }
        }

        let message = NotificationMessage::new(&ticket, self.notification_type, ctx.config.timezone);
        if ctx.channels.is_empty() {
            warn!("No notification channels are configured, delivery is a no-op");
        }

        let max_attempts = ctx.config.delivery_max_attempts;
        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let backoff_millis =
                    ctx.config.delivery_backoff_base_millis * (1 << (attempt - 2));
                sleep(Duration::from_millis(backoff_millis)).await;
            }

            match attempt_delivery(&message, ctx).await {
                Ok(()) => {
                    let sent = notification
                        .transition(NotificationEvent::Delivered {
                            sent_at: ctx.sys.get_timestamp_millis(),
                        })
                        .map_err(|_| UseCaseError::StorageError)?;
                    ctx.repos
                        .notifications
                        .save(&sent)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                    return Ok(sent);
                }
                Err(e) => {
                    warn!(
                        "Delivery attempt {}/{} for ticket {} ({}) failed: {}",
                        attempt, max_attempts, self.ticket_id, self.notification_type, e
                    );
                    last_error = e;
                }
            }
        }

        let failed = notification
            .transition(NotificationEvent::DeliveryFailed {
                error: last_error.clone(),
                at: ctx.sys.get_timestamp_millis(),
            })
            .map_err(|_| UseCaseError::StorageError)?;
        ctx.repos
            .notifications
            .save(&failed)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        error!(
            "Exhausted delivery attempts for ticket {} ({}). Last error: {}",
            self.ticket_id, self.notification_type, last_error
        );
        ctx.alerter
            .alert(&format!(
                "Notification delivery failed for ticket {} ({}): {}",
                self.ticket_id, self.notification_type, last_error
            ))
            .await;

        Err(UseCaseError::DeliveryFailed {
            attempts: max_attempts,
            last_error,
        })
    }
}

impl SendNotificationUseCase {
    /// The existing row for (ticket, type) if there is one; otherwise a
    /// fresh row, so a callback that outlived its row (or a manual
    /// trigger) still leaves an audit trail. A cancelled row counts as
    /// existing: it must keep blocking the callback it raced with, not
    /// be replaced by a fresh schedulable one.
    async fn find_or_create_notification(
        &self,
        ticket: &Ticket,
        ctx: &Context,
    ) -> Result<Notification, UseCaseError> {
        if let Some(notification) = ctx
            .repos
            .notifications
            .find_active_by_ticket_and_type(&self.ticket_id, self.notification_type)
            .await
        {
            return Ok(notification);
        }

        let cancelled = ctx
            .repos
            .notifications
            .find_by_ticket(&self.ticket_id)
            .await
            .into_iter()
            .filter(|n| n.notification_type == self.notification_type)
            .max_by_key(|n| n.updated);
        if let Some(cancelled) = cancelled {
            return Ok(cancelled);
        }

        let sale_start_at = ticket
            .sale_start_at
            .ok_or_else(|| UseCaseError::TicketNotSchedulable(self.ticket_id.clone()))?;
        let timing =
            NotificationTiming::compute(self.notification_type, sale_start_at, ctx.config.timezone);
        let notification = Notification::new(
            self.ticket_id.clone(),
            self.notification_type,
            timing.scheduled_at,
            ctx.sys.get_timestamp_millis(),
        );
        ctx.repos
            .notifications
            .insert(&notification)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        Ok(notification)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::shared::test_helpers::{albion_ticket, setup_context_at, tokyo_millis};
    use crate::shared::usecase::execute;
    use awaytix_infra::INotificationChannel;
    use std::sync::{Arc, Mutex};

    /// Channel double that fails a scripted number of times before
    /// succeeding, recording every call.
    pub struct ScriptedChannel {
        fail_remaining: Mutex<u32>,
        pub calls: Mutex<Vec<NotificationMessage>>,
    }

    impl ScriptedChannel {
        pub fn failing(times: u32) -> Arc<Self> {
            Arc::new(Self {
                fail_remaining: Mutex::new(times),
                calls: Mutex::new(vec![]),
            })
        }

        pub fn ok() -> Arc<Self> {
            Self::failing(0)
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl INotificationChannel for ScriptedChannel {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn send(&self, message: &NotificationMessage) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(message.clone());
            let mut fail_remaining = self.fail_remaining.lock().unwrap();
            if *fail_remaining > 0 {
                *fail_remaining -= 1;
                anyhow::bail!("scripted channel failure");
            }
            Ok(())
        }
    }

    async fn setup_with_channel(
        channel: Arc<ScriptedChannel>,
    ) -> (awaytix_infra::Context, Ticket, Notification) {
        // The day-before instant has just arrived
        let now = tokyo_millis(2025, 3, 14, 20, 0);
        let (mut ctx, _queue) = setup_context_at(now);
        ctx.channels = vec![channel];

        let ticket = ctx
            .repos
            .tickets
            .upsert(&albion_ticket(now))
            .await
            .unwrap();
        let timing = NotificationTiming::compute(
            NotificationType::DayBefore,
            ticket.sale_start_at.unwrap(),
            ctx.config.timezone,
        );
        let notification = Notification::new(
            ticket.id.clone(),
            NotificationType::DayBefore,
            timing.scheduled_at,
            now,
        )
        .with_external_task_id("queued-0".into());
        ctx.repos.notifications.insert(&notification).await.unwrap();

        (ctx, ticket, notification)
    }

    #[actix_web::test]
    async fn delivers_and_marks_sent() {
        let channel = ScriptedChannel::ok();
        let (ctx, ticket, _) = setup_with_channel(channel.clone()).await;

        let sent = execute(
            SendNotificationUseCase {
                ticket_id: ticket.id.clone(),
                notification_type: NotificationType::DayBefore,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(sent.status, NotificationStatus::Sent);
        assert_eq!(sent.sent_at, Some(tokyo_millis(2025, 3, 14, 20, 0)));
        assert_eq!(sent.error_message, None);
        assert_eq!(channel.call_count(), 1);
        let messages = channel.calls.lock().unwrap();
        assert!(messages[0].title.contains("tomorrow"));
    }

    #[actix_web::test]
    async fn redelivered_callback_sends_nothing_twice() {
        let channel = ScriptedChannel::ok();
        let (ctx, ticket, _) = setup_with_channel(channel.clone()).await;

        for _ in 0..2 {
            let res = execute(
                SendNotificationUseCase {
                    ticket_id: ticket.id.clone(),
                    notification_type: NotificationType::DayBefore,
                },
                &ctx,
            )
            .await
            .unwrap();
            assert_eq!(res.status, NotificationStatus::Sent);
        }

        assert_eq!(channel.call_count(), 1);
    }

    #[actix_web::test]
    async fn two_failures_then_success_still_ends_sent() {
        let channel = ScriptedChannel::failing(2);
        let (ctx, ticket, _) = setup_with_channel(channel.clone()).await;

        let sent = execute(
            SendNotificationUseCase {
                ticket_id: ticket.id.clone(),
                notification_type: NotificationType::DayBefore,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(sent.status, NotificationStatus::Sent);
        assert_eq!(sent.error_message, None);
        assert_eq!(channel.call_count(), 3);
    }

    #[actix_web::test]
    async fn exhausted_retries_mark_the_notification_failed() {
        let channel = ScriptedChannel::failing(3);
        let (ctx, ticket, notification) = setup_with_channel(channel.clone()).await;

        let res = execute(
            SendNotificationUseCase {
                ticket_id: ticket.id.clone(),
                notification_type: NotificationType::DayBefore,
            },
            &ctx,
        )
        .await;

        assert!(matches!(
            res.unwrap_err(),
            UseCaseError::DeliveryFailed { attempts: 3, .. }
        ));
        assert_eq!(channel.call_count(), 3);

        let stored = ctx.repos.notifications.find(&notification.id).await.unwrap();
        assert_eq!(stored.status, NotificationStatus::Failed);
        assert!(stored
            .error_message
            .as_deref()
            .unwrap()
            .contains("scripted channel failure"));
    }

    #[actix_web::test]
    async fn partial_channel_failure_retries_every_channel() {
        let flaky = ScriptedChannel::failing(1);
        let steady = ScriptedChannel::ok();
        let (mut ctx, ticket, _) = setup_with_channel(flaky.clone()).await;
        ctx.channels.push(steady.clone());

        let sent = execute(
            SendNotificationUseCase {
                ticket_id: ticket.id.clone(),
                notification_type: NotificationType::DayBefore,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(sent.status, NotificationStatus::Sent);
        // The attempt where one channel failed counts as failed for
        // both, so the steady channel is hit again on the retry
        assert_eq!(flaky.call_count(), 2);
        assert_eq!(steady.call_count(), 2);
    }

    #[actix_web::test]
    async fn cancellation_racing_the_callback_aborts_delivery() {
        let channel = ScriptedChannel::ok();
        let (ctx, ticket, notification) = setup_with_channel(channel.clone()).await;

        let cancelled = notification
            .transition(NotificationEvent::Cancel {
                at: ctx.sys.get_timestamp_millis(),
            })
            .unwrap();
        ctx.repos.notifications.save(&cancelled).await.unwrap();

        let res = execute(
            SendNotificationUseCase {
                ticket_id: ticket.id.clone(),
                notification_type: NotificationType::DayBefore,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(channel.call_count(), 0);
        assert_eq!(res.id, cancelled.id);
        assert_eq!(res.status, NotificationStatus::Cancelled);
    }

    #[actix_web::test]
    async fn callback_without_a_row_lazily_creates_one() {
        let channel = ScriptedChannel::ok();
        let now = tokyo_millis(2025, 3, 15, 9, 0);
        let (mut ctx, _queue) = setup_context_at(now);
        ctx.channels = vec![channel.clone()];
        let ticket = ctx
            .repos
            .tickets
            .upsert(&albion_ticket(now))
            .await
            .unwrap();

        let sent = execute(
            SendNotificationUseCase {
                ticket_id: ticket.id.clone(),
                notification_type: NotificationType::HourBefore,
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(sent.status, NotificationStatus::Sent);
        assert_eq!(sent.scheduled_at, tokyo_millis(2025, 3, 15, 9, 0));
        assert_eq!(channel.call_count(), 1);
        assert_eq!(
            ctx.repos.notifications.find_by_ticket(&ticket.id).await.len(),
            1
        );
    }

    #[actix_web::test]
    async fn missing_ticket_is_fatal() {
        let channel = ScriptedChannel::ok();
        let (ctx, _, _) = setup_with_channel(channel.clone()).await;

        let missing = ID::default();
        let res = execute(
            SendNotificationUseCase {
                ticket_id: missing.clone(),
                notification_type: NotificationType::DayBefore,
            },
            &ctx,
        )
        .await;

        assert_eq!(res.unwrap_err(), UseCaseError::TicketNotFound(missing));
        assert_eq!(channel.call_count(), 0);
    }
}
