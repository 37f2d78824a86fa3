use crate::error::AwaytixError;
use crate::notification::cancel_notifications::{
    CancelNotificationsUseCase, UseCaseError as CancelError,
};
use crate::shared::auth::protect_admin_route;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use awaytix_api_structs::delete_ticket::{APIResponse, PathParams};
use awaytix_domain::{Ticket, ID};
use awaytix_infra::Context;
use thiserror::Error;

pub async fn delete_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    protect_admin_route(&http_req, &ctx)?;

    let usecase = DeleteTicketUseCase {
        ticket_id: path_params.ticket_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|ticket| HttpResponse::Ok().json(APIResponse::new(ticket)))
        .map_err(AwaytixError::from)
}

/// Removes a ticket. Its pending work is cancelled first so a
/// notification row never outlives awareness of its ticket; a
/// cancellation failure aborts the delete.
#[derive(Debug)]
pub struct DeleteTicketUseCase {
    pub ticket_id: ID,
}

#[derive(Debug, Error, PartialEq)]
pub enum UseCaseError {
    #[error("Ticket not found: {0}")]
    NotFound(ID),
    #[error(transparent)]
    Cancellation(CancelError),
    #[error("Storage error")]
    StorageError,
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(ticket_id) => {
                Self::NotFound(format!("The ticket with id: {}, was not found.", ticket_id))
            }
            UseCaseError::Cancellation(e) => e.into(),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteTicketUseCase {
    type Response = Ticket;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteTicket";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .tickets
            .find(&self.ticket_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(self.ticket_id.clone()))?;

        execute(
            CancelNotificationsUseCase {
                ticket_id: self.ticket_id.clone(),
            },
            ctx,
        )
        .await
        .map_err(UseCaseError::Cancellation)?;

        ctx.repos
            .notifications
            .delete_by_ticket(&self.ticket_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        ctx.repos
            .tickets
            .delete(&self.ticket_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(self.ticket_id.clone()))
    }
}
