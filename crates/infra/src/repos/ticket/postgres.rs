use super::ITicketRepo;
use awaytix_domain::{SaleStatus, Ticket, ID};
use sqlx::types::{Json, Uuid};
use sqlx::{FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresTicketRepo {
    pool: PgPool,
}

impl PostgresTicketRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TicketRaw {
    ticket_uid: Uuid,
    match_name: String,
    match_date: i64,
    home_team: Option<String>,
    away_team: Option<String>,
    sale_start_at: Option<i64>,
    sale_end_at: Option<i64>,
    venue: Option<String>,
    ticket_types: Json<Vec<String>>,
    ticket_url: Option<String>,
    sale_status: String,
    notification_scheduled: bool,
    version: i64,
    scraped_at: i64,
    created: i64,
    updated: i64,
}

impl TryFrom<TicketRaw> for Ticket {
    type Error = anyhow::Error;

    fn try_from(raw: TicketRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: raw.ticket_uid.into(),
            match_name: raw.match_name,
            match_date: raw.match_date,
            home_team: raw.home_team,
            away_team: raw.away_team,
            sale_start_at: raw.sale_start_at,
            sale_end_at: raw.sale_end_at,
            venue: raw.venue,
            ticket_types: raw.ticket_types.0,
            ticket_url: raw.ticket_url,
            sale_status: raw.sale_status.parse::<SaleStatus>()?,
            notification_scheduled: raw.notification_scheduled,
            version: raw.version,
            scraped_at: raw.scraped_at,
            created: raw.created,
            updated: raw.updated,
        })
    }
}

fn into_tickets(rows: Vec<TicketRaw>) -> Vec<Ticket> {
    rows.into_iter()
        .filter_map(|raw| match Ticket::try_from(raw) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                error!("Unable to convert stored ticket row. Err: {:?}", e);
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ITicketRepo for PostgresTicketRepo {
    async fn upsert(&self, ticket: &Ticket) -> anyhow::Result<Ticket> {
        let raw: TicketRaw = sqlx::query_as(
            r#"
            INSERT INTO tickets
            (ticket_uid, match_name, match_date, home_team, away_team, sale_start_at,
             sale_end_at, venue, ticket_types, ticket_url, sale_status,
             notification_scheduled, version, scraped_at, created, updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 1, $13, $14, $15)
            ON CONFLICT (ticket_uid) DO UPDATE SET
                match_name = EXCLUDED.match_name,
                match_date = EXCLUDED.match_date,
                home_team = EXCLUDED.home_team,
                away_team = EXCLUDED.away_team,
                sale_start_at = EXCLUDED.sale_start_at,
                sale_end_at = EXCLUDED.sale_end_at,
                venue = EXCLUDED.venue,
                ticket_types = EXCLUDED.ticket_types,
                ticket_url = EXCLUDED.ticket_url,
                sale_status = EXCLUDED.sale_status,
                notification_scheduled = EXCLUDED.notification_scheduled,
                version = tickets.version + 1,
                scraped_at = EXCLUDED.scraped_at,
                updated = EXCLUDED.updated
            RETURNING *
            "#,
        )
        .bind(ticket.id.inner_ref())
        .bind(&ticket.match_name)
        .bind(ticket.match_date)
        .bind(&ticket.home_team)
        .bind(&ticket.away_team)
        .bind(ticket.sale_start_at)
        .bind(ticket.sale_end_at)
        .bind(&ticket.venue)
        .bind(Json(&ticket.ticket_types))
        .bind(&ticket.ticket_url)
        .bind(ticket.sale_status.as_str())
        .bind(ticket.notification_scheduled)
        .bind(ticket.scraped_at)
        .bind(ticket.created)
        .bind(ticket.updated)
        .fetch_one(&self.pool)
        .await?;

        Ticket::try_from(raw)
    }

    async fn find(&self, ticket_id: &ID) -> Option<Ticket> {
        let raw: Option<TicketRaw> = sqlx::query_as(
            r#"
            SELECT * FROM tickets AS t
            WHERE t.ticket_uid = $1
            "#,
        )
        .bind(ticket_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()?;

        raw.and_then(|raw| Ticket::try_from(raw).ok())
    }

    async fn find_by_status(&self, statuses: &[SaleStatus]) -> Vec<Ticket> {
        let statuses = statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect::<Vec<_>>();
        let rows: Vec<TicketRaw> = sqlx::query_as(
            r#"
            SELECT * FROM tickets AS t
            WHERE t.sale_status = ANY($1)
            "#,
        )
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();

        into_tickets(rows)
    }

    async fn find_with_match_before(&self, before: i64) -> Vec<Ticket> {
        let rows: Vec<TicketRaw> = sqlx::query_as(
            r#"
            SELECT * FROM tickets AS t
            WHERE t.match_date < $1
            "#,
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();

        into_tickets(rows)
    }

    async fn mark_notification_scheduled(
        &self,
        ticket_id: &ID,
        version: i64,
        now: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE tickets
                SET notification_scheduled = TRUE, updated = $3
            WHERE ticket_uid = $1 AND version = $2
            "#,
        )
        .bind(ticket_id.inner_ref())
        .bind(version)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, ticket_id: &ID) -> Option<Ticket> {
        let raw: Option<TicketRaw> = sqlx::query_as(
            r#"
            DELETE FROM tickets AS t
            WHERE t.ticket_uid = $1
            RETURNING *
            "#,
        )
        .bind(ticket_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()?;

        raw.and_then(|raw| Ticket::try_from(raw).ok())
    }
}
