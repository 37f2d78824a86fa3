use super::ITicketRepo;
use crate::repos::shared::inmemory_repo::*;
use awaytix_domain::{SaleStatus, Ticket, ID};

pub struct InMemoryTicketRepo {
    tickets: std::sync::Mutex<Vec<Ticket>>,
}

impl InMemoryTicketRepo {
    pub fn new() -> Self {
        Self {
            tickets: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl ITicketRepo for InMemoryTicketRepo {
    async fn upsert(&self, ticket: &Ticket) -> anyhow::Result<Ticket> {
        let mut tickets = self.tickets.lock().unwrap();
        match tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(existing) => {
                let mut stored = ticket.clone();
                stored.version = existing.version + 1;
                *existing = stored.clone();
                Ok(stored)
            }
            None => {
                let mut stored = ticket.clone();
                stored.version = 1;
                tickets.push(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn find(&self, ticket_id: &ID) -> Option<Ticket> {
        find(ticket_id, &self.tickets)
    }

    async fn find_by_status(&self, statuses: &[SaleStatus]) -> Vec<Ticket> {
        find_by(&self.tickets, |t| statuses.contains(&t.sale_status))
    }

    async fn find_with_match_before(&self, before: i64) -> Vec<Ticket> {
        find_by(&self.tickets, |t| t.match_date < before)
    }

    async fn mark_notification_scheduled(
        &self,
        ticket_id: &ID,
        version: i64,
        now: i64,
    ) -> anyhow::Result<bool> {
        let mut tickets = self.tickets.lock().unwrap();
        match tickets
            .iter_mut()
            .find(|t| t.id == *ticket_id && t.version == version)
        {
            Some(ticket) => {
                ticket.notification_scheduled = true;
                ticket.updated = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, ticket_id: &ID) -> Option<Ticket> {
        delete(ticket_id, &self.tickets)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use awaytix_domain::TicketFields;

    fn ticket() -> Ticket {
        Ticket::new(
            TicketFields {
                match_name: "Albion away at Rovers".into(),
                match_date: 1000 * 60 * 60 * 24 * 10,
                home_team: None,
                away_team: None,
                sale_start_at: Some(1000 * 60 * 60 * 24 * 5),
                sale_end_at: None,
                venue: None,
                ticket_types: vec![],
                ticket_url: None,
                sale_status: SaleStatus::BeforeSale,
            },
            0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_bumps_the_version_on_collision() {
        let repo = InMemoryTicketRepo::new();
        let stored = repo.upsert(&ticket()).await.unwrap();
        assert_eq!(stored.version, 1);

        let stored = repo.upsert(&stored).await.unwrap();
        assert_eq!(stored.version, 2);

        assert_eq!(repo.find(&stored.id).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn mark_notification_scheduled_is_version_guarded() {
        let repo = InMemoryTicketRepo::new();
        let stored = repo.upsert(&ticket()).await.unwrap();

        // Stale version loses
        assert!(!repo
            .mark_notification_scheduled(&stored.id, stored.version + 1, 10)
            .await
            .unwrap());
        assert!(!repo.find(&stored.id).await.unwrap().notification_scheduled);

        assert!(repo
            .mark_notification_scheduled(&stored.id, stored.version, 10)
            .await
            .unwrap());
        assert!(repo.find(&stored.id).await.unwrap().notification_scheduled);
    }
}
