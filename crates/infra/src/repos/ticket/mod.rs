mod inmemory;
mod postgres;

use awaytix_domain::{SaleStatus, Ticket, ID};
pub use inmemory::InMemoryTicketRepo;
pub use postgres::PostgresTicketRepo;

#[async_trait::async_trait]
pub trait ITicketRepo: Send + Sync {
    /// Inserts or, on id collision, overwrites the stored ticket and
    /// bumps its version. Returns the stored ticket. Safe to call
    /// repeatedly with identical business data.
    async fn upsert(&self, ticket: &Ticket) -> anyhow::Result<Ticket>;
    async fn find(&self, ticket_id: &ID) -> Option<Ticket>;
    async fn find_by_status(&self, statuses: &[SaleStatus]) -> Vec<Ticket>;
    async fn find_with_match_before(&self, before: i64) -> Vec<Ticket>;
    /// Conditional update guarding against a concurrent upsert: marks
    /// the ticket scheduled only while its version is still `version`.
    /// Returns whether the update applied.
    async fn mark_notification_scheduled(
        &self,
        ticket_id: &ID,
        version: i64,
        now: i64,
    ) -> anyhow::Result<bool>;
    async fn delete(&self, ticket_id: &ID) -> Option<Ticket>;
}
