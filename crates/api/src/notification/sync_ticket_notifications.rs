use super::cancel_notifications::{CancelNotificationsUseCase, UseCaseError as CancelError};
use super::schedule_notifications::{ScheduleNotificationsUseCase, UseCaseError as ScheduleError};
use crate::error::AwaytixError;
use crate::shared::usecase::{execute, UseCase};
use awaytix_domain::{SaleStatus, Ticket};
use awaytix_infra::Context;
use thiserror::Error;

/// Reconciles a ticket's scheduled notifications with its latest
/// state: schedule on first sighting, cancel-and-reschedule when the
/// sale facts changed, cancel when the sale window closed or the ticket
/// was removed, and otherwise leave everything alone.
#[derive(Debug)]
pub struct SyncTicketNotificationsUseCase<'a> {
    pub trigger: SyncNotificationsTrigger<'a>,
}

#[derive(Debug)]
pub enum SyncNotificationsTrigger<'a> {
    /// Ingestion upserted `Ticket`; the previously stored row (if any)
    /// decides schedule vs. reschedule vs. no-op.
    TicketIngested(&'a Ticket, Option<&'a Ticket>),
    /// The ticket is being removed, all of its pending work goes away
    TicketRemoved(&'a Ticket),
}

#[derive(Debug, PartialEq)]
pub enum SyncOutcome {
    Scheduled(usize),
    Rescheduled(usize),
    Cancelled(usize),
    Noop,
}

#[derive(Debug, Error, PartialEq)]
pub enum UseCaseError {
    #[error(transparent)]
    Scheduling(ScheduleError),
    #[error(transparent)]
    Cancellation(CancelError),
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::Scheduling(e) => e.into(),
            UseCaseError::Cancellation(e) => e.into(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<'a> UseCase for SyncTicketNotificationsUseCase<'a> {
    type Response = SyncOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncTicketNotifications";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        match &self.trigger {
            SyncNotificationsTrigger::TicketIngested(ticket, previous) => {
                let now = ctx.sys.get_timestamp_millis();

                if ticket.should_reschedule_notification(*previous, now) {
                    // The sale facts moved: the old instants are wrong,
                    // cancel before scheduling so no type ever has two
                    // active notifications
                    execute(
                        CancelNotificationsUseCase {
                            ticket_id: ticket.id.clone(),
                        },
                        ctx,
                    )
                    .await
                    .map_err(UseCaseError::Cancellation)?;

                    let scheduled = execute(
                        ScheduleNotificationsUseCase {
                            ticket: (*ticket).clone(),
                        },
                        ctx,
                    )
                    .await
                    .map_err(UseCaseError::Scheduling)?;
                    return Ok(SyncOutcome::Rescheduled(scheduled.len()));
                }

                if ticket.should_schedule_notification(now) {
                    let scheduled = execute(
                        ScheduleNotificationsUseCase {
                            ticket: (*ticket).clone(),
                        },
                        ctx,
                    )
                    .await
                    .map_err(UseCaseError::Scheduling)?;
                    return Ok(SyncOutcome::Scheduled(scheduled.len()));
                }

                if ticket.sale_status != SaleStatus::BeforeSale {
                    // The window closed; reminders for it are moot
                    let cancelled = execute(
                        CancelNotificationsUseCase {
                            ticket_id: ticket.id.clone(),
                        },
                        ctx,
                    )
                    .await
                    .map_err(UseCaseError::Cancellation)?;
                    if !cancelled.is_empty() {
                        return Ok(SyncOutcome::Cancelled(cancelled.len()));
                    }
                }

                Ok(SyncOutcome::Noop)
            }
            SyncNotificationsTrigger::TicketRemoved(ticket) => {
                let cancelled = execute(
                    CancelNotificationsUseCase {
                        ticket_id: ticket.id.clone(),
                    },
                    ctx,
                )
                .await
                .map_err(UseCaseError::Cancellation)?;
                Ok(SyncOutcome::Cancelled(cancelled.len()))
            }
        }
    }
}
