mod notification;
mod shared;
mod ticket;

use notification::{INotificationRepo, InMemoryNotificationRepo, PostgresNotificationRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use ticket::{ITicketRepo, InMemoryTicketRepo, PostgresTicketRepo};
use tracing::info;

pub use shared::repo::DeleteResult;

#[derive(Clone)]
pub struct Repos {
    pub tickets: Arc<dyn ITicketRepo>,
    pub notifications: Arc<dyn INotificationRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            tickets: Arc::new(PostgresTicketRepo::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            tickets: Arc::new(InMemoryTicketRepo::new()),
            notifications: Arc::new(InMemoryNotificationRepo::new()),
        }
    }
}
