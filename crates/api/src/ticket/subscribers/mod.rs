use super::ingest_ticket::{IngestTicketResponse, IngestTicketUseCase};
use crate::notification::sync_ticket_notifications::{
    SyncNotificationsTrigger, SyncTicketNotificationsUseCase,
};
use crate::shared::usecase::{execute, Subscriber};
use awaytix_infra::Context;

pub struct SyncNotificationsOnTicketIngested;

#[async_trait::async_trait(?Send)]
impl Subscriber<IngestTicketUseCase> for SyncNotificationsOnTicketIngested {
    async fn notify(&self, e: &IngestTicketResponse, ctx: &Context) {
        let sync_notifications = SyncTicketNotificationsUseCase {
            trigger: SyncNotificationsTrigger::TicketIngested(&e.ticket, e.previous.as_ref()),
        };

        // Sideeffect, ignore result
        let _ = execute(sync_notifications, ctx).await;
    }
}
