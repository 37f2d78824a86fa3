use super::subscribers::SyncNotificationsOnTicketIngested;
use crate::error::AwaytixError;
use crate::shared::auth::protect_admin_route;
use crate::shared::usecase::{execute, Subscriber, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use awaytix_api_structs::ingest_ticket::{APIResponse, RequestBody};
use awaytix_domain::{InvalidTicketError, Ticket, TicketFields};
use awaytix_infra::Context;

/// Ingestion boundary: the scraping pipeline posts every ticket fact it
/// extracts here, new or not.
pub async fn ingest_ticket_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, AwaytixError> {
    protect_admin_route(&http_req, &ctx)?;

    let body = body.0;
    let usecase = IngestTicketUseCase {
        fields: TicketFields {
            match_name: body.match_name,
            match_date: body.match_date,
            home_team: body.home_team,
            away_team: body.away_team,
            sale_start_at: body.sale_start_at,
            sale_end_at: body.sale_end_at,
            venue: body.venue,
            ticket_types: body.ticket_types.unwrap_or_default(),
            ticket_url: body.ticket_url,
            sale_status: body.sale_status,
        },
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(APIResponse::new(res.ticket)))
        .map_err(AwaytixError::from)
}

/// Upserts a scraped ticket: the deterministic id folds re-scrapes of
/// the same match onto the stored row, scraped facts are merged in, and
/// the scheduling pipeline is kicked through a subscriber once the
/// upsert is durable.
#[derive(Debug)]
pub struct IngestTicketUseCase {
    pub fields: TicketFields,
}

#[derive(Debug)]
pub struct IngestTicketResponse {
    pub ticket: Ticket,
    pub previous: Option<Ticket>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidTicket(InvalidTicketError),
    StorageError,
}

impl From<UseCaseError> for AwaytixError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidTicket(e) => Self::BadClientData(e.to_string()),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for IngestTicketUseCase {
    type Response = IngestTicketResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "IngestTicket";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let candidate =
            Ticket::new(self.fields.clone(), now).map_err(UseCaseError::InvalidTicket)?;

        let previous = ctx.repos.tickets.find(&candidate.id).await;
        let merged = match &previous {
            Some(previous) => previous.apply_scrape(&candidate, now),
            None => candidate,
        };

        let ticket = ctx
            .repos
            .tickets
            .upsert(&merged)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(IngestTicketResponse { ticket, previous })
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(SyncNotificationsOnTicketIngested)]
    }
}
