use super::send_notification::SendNotificationUseCase;
use crate::error::AwaytixError;
use crate::shared::auth::protect_admin_route;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use awaytix_api_structs::process_pending::APIResponse;
use awaytix_infra::Context;
use futures::future::join_all;
use tracing::info;

pub async fn process_pending_controller(
    http_req: HttpRequest,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    protect_admin_route(&http_req, &ctx)?;

    execute(ProcessPendingNotificationsUseCase, &ctx)
        .await
        .map(|report| {
            HttpResponse::Ok().json(APIResponse {
                processed: report.processed,
                failed: report.failed,
            })
        })
        .map_err(AwaytixError::from)
}

/// Sweep/backfill path: finds scheduled notifications whose target
/// instant is close enough (or already past) and pushes each through
/// the normal delivery state machine. Covers callbacks the task queue
/// dropped or delivered into an outage.
#[derive(Debug)]
pub struct ProcessPendingNotificationsUseCase;

#[derive(Debug, PartialEq)]
pub struct PendingReport {
    pub processed: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum UseCaseError {}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ProcessPendingNotificationsUseCase {
    type Response = PendingReport;

    type Error = UseCaseError;

    const NAME: &'static str = "ProcessPendingNotifications";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let due = ctx
            .repos
            .notifications
            .find_due_scheduled(now + ctx.config.pending_sweep_window_millis)
            .await;

        if due.is_empty() {
            return Ok(PendingReport {
                processed: 0,
                failed: 0,
            });
        }
        info!("Processing {} pending notifications", due.len());

        let results = join_all(due.into_iter().map(|notification| {
            execute(
                SendNotificationUseCase {
                    ticket_id: notification.ticket_id.clone(),
                    notification_type: notification.notification_type,
                },
                ctx,
            )
        }))
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        Ok(PendingReport {
            processed: results.len(),
            failed,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::notification::send_notification::test::ScriptedChannel;
    use crate::shared::test_helpers::{albion_ticket, setup_context_at, tokyo_millis};
    use awaytix_domain::{Notification, NotificationStatus, NotificationType, NotificationTiming};

    #[actix_web::test]
    async fn only_due_notifications_are_swept() {
        // Three minutes before the hour-before reminder is due
        let now = tokyo_millis(2025, 3, 15, 8, 57);
        let channel = ScriptedChannel::ok();
        let (mut ctx, _queue) = setup_context_at(now);
        ctx.channels = vec![channel.clone()];
        let ticket = ctx.repos.tickets.upsert(&albion_ticket(now)).await.unwrap();

        let sale_start_at = ticket.sale_start_at.unwrap();
        for notification_type in [NotificationType::HourBefore, NotificationType::MinutesBefore] {
            let timing =
                NotificationTiming::compute(notification_type, sale_start_at, ctx.config.timezone);
            let notification = Notification::new(
                ticket.id.clone(),
                notification_type,
                timing.scheduled_at,
                now,
            );
            ctx.repos.notifications.insert(&notification).await.unwrap();
        }

        let report = execute(ProcessPendingNotificationsUseCase, &ctx)
            .await
            .unwrap();
        assert_eq!(
            report,
            PendingReport {
                processed: 1,
                failed: 0
            }
        );
        assert_eq!(channel.call_count(), 1);

        let notifications = ctx.repos.notifications.find_by_ticket(&ticket.id).await;
        let sent = notifications
            .iter()
            .find(|n| n.notification_type == NotificationType::HourBefore)
            .unwrap();
        assert_eq!(sent.status, NotificationStatus::Sent);
        let pending = notifications
            .iter()
            .find(|n| n.notification_type == NotificationType::MinutesBefore)
            .unwrap();
        assert_eq!(pending.status, NotificationStatus::Scheduled);
    }

    #[actix_web::test]
    async fn failures_are_counted_not_raised() {
        let now = tokyo_millis(2025, 3, 15, 9, 0);
        let channel = ScriptedChannel::ok();
        let (mut ctx, _queue) = setup_context_at(now);
        ctx.channels = vec![channel.clone()];

        // Orphaned notification: its ticket was never stored
        let orphan = Notification::new(
            Default::default(),
            NotificationType::HourBefore,
            now,
            now,
        );
        ctx.repos.notifications.insert(&orphan).await.unwrap();

        let report = execute(ProcessPendingNotificationsUseCase, &ctx)
            .await
            .unwrap();
        assert_eq!(
            report,
            PendingReport {
                processed: 1,
                failed: 1
            }
        );
        assert_eq!(channel.call_count(), 0);
    }
}
