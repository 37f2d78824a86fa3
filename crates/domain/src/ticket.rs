use crate::shared::entity::{Entity, ID};
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// How long after the sale has started a ticket is still considered
/// worth notifying about. Beyond this the sale window is stale.
const SALE_START_GRACE_MILLIS: i64 = 1000 * 60 * 60 * 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    BeforeSale,
    OnSale,
    Ended,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeSale => "before_sale",
            Self::OnSale => "on_sale",
            Self::Ended => "ended",
        }
    }
}

impl Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum InvalidSaleStatusError {
    #[error("Sale status: {0} is not recognized")]
    Unrecognized(String),
}

impl FromStr for SaleStatus {
    type Err = InvalidSaleStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before_sale" => Ok(Self::BeforeSale),
            "on_sale" => Ok(Self::OnSale),
            "ended" => Ok(Self::Ended),
            _ => Err(InvalidSaleStatusError::Unrecognized(s.to_string())),
        }
    }
}

/// A `Ticket` represents one away-match ticket sale window as observed
/// on a third-party ticketing site. Its identity is derived from the
/// match itself, so re-scraping the same match always converges on the
/// same `Ticket` instead of creating a duplicate.
///
/// All timestamps are unix millis (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
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
    /// Optimistic concurrency token, bumped by the store on every upsert.
    pub version: i64,
    pub scraped_at: i64,
    pub created: i64,
    pub updated: i64,
}

impl Entity for Ticket {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidTicketError {
    #[error("A ticket must have a non-empty match name")]
    EmptyMatchName,
    #[error("Ticket url: {0} is not a valid http(s) url")]
    InvalidTicketUrl(String),
}

#[derive(Debug, Clone)]
pub struct TicketFields {
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
}

impl Ticket {
    pub fn new(fields: TicketFields, now: i64) -> Result<Self, InvalidTicketError> {
        let normalized_name = normalize_match_name(&fields.match_name);
        if normalized_name.is_empty() {
            return Err(InvalidTicketError::EmptyMatchName);
        }

        if let Some(ticket_url) = &fields.ticket_url {
            let allowed_schemes = ["https", "http"];
            match url::Url::parse(ticket_url) {
                Ok(parsed) if allowed_schemes.contains(&parsed.scheme()) => {}
                _ => return Err(InvalidTicketError::InvalidTicketUrl(ticket_url.clone())),
            }
        }

        Ok(Self {
            id: Self::generate_id(&fields.match_name, fields.match_date),
            match_name: fields.match_name,
            match_date: fields.match_date,
            home_team: fields.home_team,
            away_team: fields.away_team,
            sale_start_at: fields.sale_start_at,
            sale_end_at: fields.sale_end_at,
            venue: fields.venue,
            ticket_types: fields.ticket_types,
            ticket_url: fields.ticket_url,
            sale_status: fields.sale_status,
            notification_scheduled: false,
            version: 1,
            scraped_at: now,
            created: now,
            updated: now,
        })
    }

    /// Deterministic identity: normalized match name + the match's
    /// calendar day. Kick-off time corrections on a re-scrape do not
    /// change the id.
    pub fn generate_id(match_name: &str, match_date: i64) -> ID {
        let day = DateTime::<Utc>::from_timestamp_millis(match_date)
            .map(|d| d.date_naive().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| match_date.to_string());
        ID::from_name(&format!("{}@{}", normalize_match_name(match_name), day))
    }

    /// Merges a freshly scraped `Ticket` into this stored one. Scraped
    /// fields win when present; identity, creation time and version are
    /// kept. When the merge changes the sale start, the ticket types or
    /// the ticket url, `notification_scheduled` is reset so the
    /// scheduling pipeline picks the ticket up again.
    pub fn apply_scrape(&self, fresh: &Ticket, now: i64) -> Ticket {
        let mut merged = Ticket {
            id: self.id.clone(),
            match_name: fresh.match_name.clone(),
            match_date: fresh.match_date,
            home_team: fresh.home_team.clone().or_else(|| self.home_team.clone()),
            away_team: fresh.away_team.clone().or_else(|| self.away_team.clone()),
            sale_start_at: fresh.sale_start_at.or(self.sale_start_at),
            sale_end_at: fresh.sale_end_at.or(self.sale_end_at),
            venue: fresh.venue.clone().or_else(|| self.venue.clone()),
            ticket_types: if fresh.ticket_types.is_empty() {
                self.ticket_types.clone()
            } else {
                fresh.ticket_types.clone()
            },
            ticket_url: fresh.ticket_url.clone().or_else(|| self.ticket_url.clone()),
            sale_status: fresh.sale_status,
            notification_scheduled: self.notification_scheduled,
            version: self.version,
            scraped_at: now,
            created: self.created,
            updated: now,
        };
        if merged.needs_reschedule(self) {
            merged.notification_scheduled = false;
        }
        merged
    }

    /// A ticket is only worth notifying about while the match is in the
    /// future, the sale start is known, and the sale has not been
    /// running for more than a day already.
    pub fn is_valid_for_notification(&self, now: i64) -> bool {
        if self.match_date <= now {
            return false;
        }
        match self.sale_start_at {
            Some(sale_start_at) => now <= sale_start_at + SALE_START_GRACE_MILLIS,
            None => false,
        }
    }

    pub fn requires_notification(&self) -> bool {
        self.sale_status == SaleStatus::BeforeSale
            && !self.notification_scheduled
            && self.sale_start_at.is_some()
    }

    pub fn should_schedule_notification(&self, now: i64) -> bool {
        self.is_valid_for_notification(now) && self.requires_notification()
    }

    /// Whether the notification-relevant facts differ from `previous`:
    /// sale start, the set of ticket types (order-insensitive) or the
    /// ticket url.
    pub fn needs_reschedule(&self, previous: &Ticket) -> bool {
        self.sale_start_at != previous.sale_start_at
            || sorted_types(&self.ticket_types) != sorted_types(&previous.ticket_types)
            || self.ticket_url != previous.ticket_url
    }

    pub fn should_reschedule_notification(&self, previous: Option<&Ticket>, now: i64) -> bool {
        match previous {
            Some(previous) => {
                self.needs_reschedule(previous) && self.should_schedule_notification(now)
            }
            None => false,
        }
    }
}

fn normalize_match_name(match_name: &str) -> String {
    match_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn sorted_types(ticket_types: &[String]) -> Vec<&str> {
    let mut types = ticket_types.iter().map(String::as_str).collect::<Vec<_>>();
    types.sort_unstable();
    types
}

#[cfg(test)]
mod test {
    use super::*;

    fn fields() -> TicketFields {
        TicketFields {
            match_name: "Albion away at Rovers".into(),
            match_date: 1000 * 60 * 60 * 24 * 10,
            home_team: Some("Rovers".into()),
            away_team: Some("Albion".into()),
            sale_start_at: Some(1000 * 60 * 60 * 24 * 5),
            sale_end_at: None,
            venue: Some("Rovers Park".into()),
            ticket_types: vec!["away end".into(), "wheelchair".into()],
            ticket_url: Some("https://tickets.example.com/rovers".into()),
            sale_status: SaleStatus::BeforeSale,
        }
    }

    #[test]
    fn rescraping_the_same_match_yields_the_same_id() {
        let id1 = Ticket::generate_id("Albion away at Rovers", 1742137200000);
        let id2 = Ticket::generate_id("  albion  AWAY at rovers ", 1742137200000);
        // Kick-off moved by two hours on the same day
        let id3 = Ticket::generate_id("Albion away at Rovers", 1742137200000 + 1000 * 60 * 60 * 2);
        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
    }

    #[test]
    fn it_rejects_empty_match_names() {
        let mut f = fields();
        f.match_name = "   ".into();
        assert_eq!(
            Ticket::new(f, 0).unwrap_err(),
            InvalidTicketError::EmptyMatchName
        );
    }

    #[test]
    fn it_rejects_invalid_ticket_urls() {
        let mut f = fields();
        f.ticket_url = Some("ftp://tickets.example.com".into());
        assert!(matches!(
            Ticket::new(f, 0).unwrap_err(),
            InvalidTicketError::InvalidTicketUrl(_)
        ));
    }

    #[test]
    fn eligibility_requires_known_future_sale() {
        let ticket = Ticket::new(fields(), 0).unwrap();
        let sale_start_at = ticket.sale_start_at.unwrap();

        assert!(ticket.should_schedule_notification(0));
        // Sale started less than a day ago: still eligible
        assert!(ticket.is_valid_for_notification(sale_start_at + 1000 * 60 * 60 * 23));
        // More than a day past sale start: stale
        assert!(!ticket.is_valid_for_notification(sale_start_at + 1000 * 60 * 60 * 25));
        // Match already played
        assert!(!ticket.is_valid_for_notification(ticket.match_date));

        let mut unknown_sale = ticket.clone();
        unknown_sale.sale_start_at = None;
        assert!(!unknown_sale.should_schedule_notification(0));
    }

    #[test]
    fn requires_notification_is_false_outside_before_sale_or_when_scheduled() {
        let ticket = Ticket::new(fields(), 0).unwrap();

        let mut on_sale = ticket.clone();
        on_sale.sale_status = SaleStatus::OnSale;
        assert!(!on_sale.requires_notification());

        let mut ended = ticket.clone();
        ended.sale_status = SaleStatus::Ended;
        assert!(!ended.requires_notification());

        let mut scheduled = ticket;
        scheduled.notification_scheduled = true;
        assert!(!scheduled.requires_notification());
    }

    #[test]
    fn merge_resets_scheduled_flag_only_on_relevant_changes() {
        let mut stored = Ticket::new(fields(), 0).unwrap();
        stored.notification_scheduled = true;
        stored.version = 3;

        // Identical re-scrape: nothing to re-arm
        let same = Ticket::new(fields(), 100).unwrap();
        let merged = stored.apply_scrape(&same, 100);
        assert!(merged.notification_scheduled);
        assert_eq!(merged.version, 3);
        assert_eq!(merged.created, stored.created);
        assert_eq!(merged.scraped_at, 100);

        // Ticket types in a different order: still the same set
        let mut shuffled_fields = fields();
        shuffled_fields.ticket_types = vec!["wheelchair".into(), "away end".into()];
        let shuffled = Ticket::new(shuffled_fields, 100).unwrap();
        assert!(stored.apply_scrape(&shuffled, 100).notification_scheduled);

        // Sale start moved: re-arm
        let mut moved_fields = fields();
        moved_fields.sale_start_at = Some(stored.sale_start_at.unwrap() + 1000 * 60 * 60 * 2);
        let moved = Ticket::new(moved_fields, 100).unwrap();
        let merged = stored.apply_scrape(&moved, 100);
        assert!(!merged.notification_scheduled);
        assert!(merged.should_reschedule_notification(Some(&stored), 200));
    }

    #[test]
    fn merge_keeps_known_fields_the_rescrape_lost() {
        let stored = Ticket::new(fields(), 0).unwrap();

        let mut sparse_fields = fields();
        sparse_fields.venue = None;
        sparse_fields.ticket_types = vec![];
        let sparse = Ticket::new(sparse_fields, 100).unwrap();

        let merged = stored.apply_scrape(&sparse, 100);
        assert_eq!(merged.venue, stored.venue);
        assert_eq!(merged.ticket_types, stored.ticket_types);
    }
}
