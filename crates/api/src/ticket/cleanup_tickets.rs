use crate::error::AwaytixError;
use crate::notification::cancel_notifications::CancelNotificationsUseCase;
use crate::shared::usecase::{execute, UseCase};
use awaytix_domain::Ticket;
use awaytix_infra::Context;
use futures::future::join_all;
use tracing::{info, warn};

/// Retention cleanup: tickets whose match is long past carry no
/// information anyone needs, so they (and their notification history)
/// are removed. A ticket whose cleanup fails is skipped and retried on
/// the next run.
#[derive(Debug)]
pub struct CleanupTicketsUseCase;

#[derive(Debug)]
pub enum UseCaseError {}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

async fn cleanup_ticket(ticket: Ticket, ctx: &Context) -> bool {
    if let Err(e) = execute(
        CancelNotificationsUseCase {
            ticket_id: ticket.id.clone(),
        },
        ctx,
    )
    .await
    {
        warn!(
            "Skipping retention cleanup of ticket {}: {:?}",
            ticket.id, e
        );
        return false;
    }
    if let Err(e) = ctx.repos.notifications.delete_by_ticket(&ticket.id).await {
        warn!(
            "Skipping retention cleanup of ticket {}: {:?}",
            ticket.id, e
        );
        return false;
    }
    ctx.repos.tickets.delete(&ticket.id).await.is_some()
}

#[async_trait::async_trait(?Send)]
impl UseCase for CleanupTicketsUseCase {
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "CleanupTickets";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let cutoff = ctx.sys.get_timestamp_millis() - ctx.config.ticket_retention_millis;
        let expired = ctx.repos.tickets.find_with_match_before(cutoff).await;
        if expired.is_empty() {
            return Ok(0);
        }

        let results = join_all(
            expired
                .into_iter()
                .map(|ticket| cleanup_ticket(ticket, ctx)),
        )
        .await;

        let deleted = results.into_iter().filter(|deleted| *deleted).count();
        info!("Retention cleanup removed {} tickets", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_helpers::{setup_context_at, tokyo_millis};
    use awaytix_domain::{SaleStatus, TicketFields};

    fn played_match(match_date: i64) -> Ticket {
        Ticket::new(
            TicketFields {
                match_name: format!("fixture at {}", match_date),
                match_date,
                home_team: None,
                away_team: None,
                sale_start_at: None,
                sale_end_at: None,
                venue: None,
                ticket_types: vec![],
                ticket_url: None,
                sale_status: SaleStatus::Ended,
            },
            0,
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn removes_only_long_past_matches() {
        let now = tokyo_millis(2025, 6, 1, 12, 0);
        let (ctx, _queue) = setup_context_at(now);

        let long_past = ctx
            .repos
            .tickets
            .upsert(&played_match(now - 1000 * 60 * 60 * 24 * 40))
            .await
            .unwrap();
        let recent = ctx
            .repos
            .tickets
            .upsert(&played_match(now - 1000 * 60 * 60 * 24 * 5))
            .await
            .unwrap();

        let deleted = execute(CleanupTicketsUseCase, &ctx).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(ctx.repos.tickets.find(&long_past.id).await.is_none());
        assert!(ctx.repos.tickets.find(&recent.id).await.is_some());
    }
}
