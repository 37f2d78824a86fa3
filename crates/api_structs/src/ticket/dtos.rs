use awaytix_domain::{SaleStatus, Ticket, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketDTO {
    pub id: ID,
    pub match_name: String,
    pub match_date: i64,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub sale_start_at: Option<i64>,
    pub sale_end_at: Option<i64>,
    pub venue: Option<String>,
    pub ticket_types: Vec<String>,
    pub ticket_url: Option<String>,
    pub sale_status: SaleStatus,
    pub notification_scheduled: bool,
    pub scraped_at: i64,
    pub created: i64,
    pub updated: i64,
}

impl TicketDTO {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            match_name: ticket.match_name,
            match_date: ticket.match_date,
            home_team: ticket.home_team,
            away_team: ticket.away_team,
            sale_start_at: ticket.sale_start_at,
            sale_end_at: ticket.sale_end_at,
            venue: ticket.venue,
            ticket_types: ticket.ticket_types,
            ticket_url: ticket.ticket_url,
            sale_status: ticket.sale_status,
            notification_scheduled: ticket.notification_scheduled,
            scraped_at: ticket.scraped_at,
            created: ticket.created,
            updated: ticket.updated,
        }
    }
}
