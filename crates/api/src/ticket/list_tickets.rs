use crate::error::AwaytixError;
use crate::shared::auth::protect_admin_route;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use awaytix_api_structs::list_tickets::{APIResponse, QueryParams};
use awaytix_domain::{SaleStatus, Ticket};
use awaytix_infra::Context;

pub async fn list_tickets_controller(
    http_req: HttpRequest,
    query_params: web::Query<QueryParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    protect_admin_route(&http_req, &ctx)?;

    let usecase = ListTicketsUseCase {
        sale_status: query_params.sale_status,
    };

    execute(usecase, &ctx)
        .await
        .map(|tickets| HttpResponse::Ok().json(APIResponse::new(tickets)))
        .map_err(AwaytixError::from)
}

#[derive(Debug)]
pub struct ListTicketsUseCase {
    /// Restrict to one sale status; `None` lists everything
    pub sale_status: Option<SaleStatus>,
}

#[derive(Debug)]
pub enum UseCaseError {}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ListTicketsUseCase {
    type Response = Vec<Ticket>;

    type Error = UseCaseError;

    const NAME: &'static str = "ListTickets";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let statuses = match self.sale_status {
            Some(sale_status) => vec![sale_status],
            None => vec![SaleStatus::BeforeSale, SaleStatus::OnSale, SaleStatus::Ended],
        };
        Ok(ctx.repos.tickets.find_by_status(&statuses).await)
    }
}
