use awaytix_domain::{SaleStatus, Ticket, TicketFields};
use awaytix_infra::{Context, ISys, InMemoryTaskQueue};
use chrono::prelude::*;
use chrono_tz::Asia::Tokyo;
use std::sync::Arc;

pub struct StaticTimeSys(pub i64);

impl ISys for StaticTimeSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.0
    }
}

pub fn tokyo_millis(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
    Tokyo
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .timestamp_millis()
}

/// A quiet afternoon two weeks before the sale starts
pub fn march_1() -> i64 {
    tokyo_millis(2025, 3, 1, 12, 0)
}

/// Away fixture with tickets on sale 2025-03-15T10:00+09:00
pub fn albion_ticket(now: i64) -> Ticket {
    Ticket::new(
        TicketFields {
            match_name: "Albion away at Rovers".into(),
            match_date: tokyo_millis(2025, 3, 16, 19, 0),
            home_team: Some("Rovers".into()),
            away_team: Some("Albion".into()),
            sale_start_at: Some(tokyo_millis(2025, 3, 15, 10, 0)),
            sale_end_at: None,
            venue: Some("Rovers Park".into()),
            ticket_types: vec!["away end".into()],
            ticket_url: Some("https://tickets.example.com/rovers".into()),
            sale_status: SaleStatus::BeforeSale,
        },
        now,
    )
    .unwrap()
}

/// In-memory context frozen at `now`, with an inspectable task queue
/// and a configured callback url
pub fn setup_context_at(now: i64) -> (Context, Arc<InMemoryTaskQueue>) {
    let mut ctx = Context::create_inmemory();
    ctx.sys = Arc::new(StaticTimeSys(now));
    ctx.config.timezone = Tokyo;
    ctx.config.callback_base_url = Some("https://awaytix.example.com".into());
    ctx.config.delivery_backoff_base_millis = 0;
    let queue = Arc::new(InMemoryTaskQueue::new());
    ctx.task_queue = queue.clone();
    (ctx, queue)
}
