use crate::dtos::{NotificationDTO, TicketDTO};
use awaytix_domain::{Notification, SaleStatus, Ticket, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub ticket: TicketDTO,
}

impl TicketResponse {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket: TicketDTO::new(ticket),
        }
    }
}

pub mod ingest_ticket {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub match_name: String,
        pub match_date: i64,
        pub home_team: Option<String>,
        pub away_team: Option<String>,
        pub sale_start_at: Option<i64>,
        pub sale_end_at: Option<i64>,
        pub venue: Option<String>,
        pub ticket_types: Option<Vec<String>>,
        pub ticket_url: Option<String>,
        pub sale_status: SaleStatus,
    }

    pub type APIResponse = TicketResponse;
}

pub mod get_ticket {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub ticket_id: ID,
    }

    pub type APIResponse = TicketResponse;
}

pub mod list_tickets {
    use super::*;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub sale_status: Option<SaleStatus>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub tickets: Vec<TicketDTO>,
    }

    impl APIResponse {
        pub fn new(tickets: Vec<Ticket>) -> Self {
            Self {
                tickets: tickets.into_iter().map(TicketDTO::new).collect(),
            }
        }
    }
}

pub mod delete_ticket {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub ticket_id: ID,
    }

    pub type APIResponse = TicketResponse;
}

pub mod get_ticket_notifications {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub ticket_id: ID,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub notifications: Vec<NotificationDTO>,
    }

    impl APIResponse {
        pub fn new(notifications: Vec<Notification>) -> Self {
            Self {
                notifications: notifications.into_iter().map(NotificationDTO::new).collect(),
            }
        }
    }
}
