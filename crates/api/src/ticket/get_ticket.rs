use crate::error::AwaytixError;
use crate::shared::auth::protect_admin_route;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use awaytix_api_structs::get_ticket::{APIResponse, PathParams};
use awaytix_domain::{Ticket, ID};
use awaytix_infra::Context;

pub async fn get_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    protect_admin_route(&http_req, &ctx)?;

    let usecase = GetTicketUseCase {
        ticket_id: path_params.ticket_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|ticket| HttpResponse::Ok().json(APIResponse::new(ticket)))
        .map_err(AwaytixError::from)
}

#[derive(Debug)]
pub struct GetTicketUseCase {
    pub ticket_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(ticket_id) => {
                Self::NotFound(format!("The ticket with id: {}, was not found.", ticket_id))
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetTicketUseCase {
    type Response = Ticket;

    type Error = UseCaseError;

    const NAME: &'static str = "GetTicket";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .tickets
            .find(&self.ticket_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(self.ticket_id.clone()))
    }
}
