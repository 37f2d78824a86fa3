use crate::notification::{Notification, NotificationType};
use crate::ticket::Ticket;
use crate::timing::NotificationTiming;
use chrono_tz::Tz;

/// Computes the notification timings a ticket still needs: one per
/// type, skipping instants that are already in the past and types that
/// already have an active (non-cancelled) notification.
///
/// Pure and deterministic given (ticket, existing, now); the caller
/// hands the result to the scheduler.
pub fn compute_required_timings(
    ticket: &Ticket,
    existing: &[Notification],
    timezone: Tz,
    now: i64,
) -> Vec<NotificationTiming> {
    let sale_start_at = match ticket.sale_start_at {
        Some(sale_start_at) => sale_start_at,
        None => return Vec::new(),
    };

    NotificationType::ALL
        .iter()
        .filter_map(|notification_type| {
            let timing = NotificationTiming::compute(*notification_type, sale_start_at, timezone);
            if timing.scheduled_at <= now {
                return None;
            }
            let covered = existing
                .iter()
                .any(|n| n.notification_type == *notification_type && n.is_active());
            if covered {
                None
            } else {
                Some(timing)
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::notification::NotificationEvent;
    use crate::ticket::{SaleStatus, TicketFields};
    use chrono::prelude::*;
    use chrono_tz::Asia::Tokyo;

    fn ticket() -> Ticket {
        Ticket::new(
            TicketFields {
                match_name: "Albion away at Rovers".into(),
                match_date: Tokyo
                    .with_ymd_and_hms(2025, 3, 16, 19, 0, 0)
                    .unwrap()
                    .timestamp_millis(),
                home_team: None,
                away_team: None,
                sale_start_at: Some(
                    Tokyo
                        .with_ymd_and_hms(2025, 3, 15, 10, 0, 0)
                        .unwrap()
                        .timestamp_millis(),
                ),
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

    #[test]
    fn all_three_timings_when_nothing_is_scheduled_yet() {
        let ticket = ticket();
        let now = Tokyo
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        let timings = compute_required_timings(&ticket, &[], Tokyo, now);
        assert_eq!(
            timings.iter().map(|t| t.notification_type).collect::<Vec<_>>(),
            NotificationType::ALL.to_vec()
        );
        assert!(timings.iter().all(|t| t.scheduled_at > now));
    }

    #[test]
    fn past_instants_are_never_scheduled() {
        let ticket = ticket();
        // The evening before has already passed, only the two short
        // leads remain.
        let now = Tokyo
            .with_ymd_and_hms(2025, 3, 14, 21, 0, 0)
            .unwrap()
            .timestamp_millis();
        let timings = compute_required_timings(&ticket, &[], Tokyo, now);
        assert_eq!(
            timings.iter().map(|t| t.notification_type).collect::<Vec<_>>(),
            vec![NotificationType::HourBefore, NotificationType::MinutesBefore]
        );
    }

    #[test]
    fn active_notifications_cover_their_type() {
        let ticket = ticket();
        let now = Tokyo
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .unwrap()
            .timestamp_millis();

        let timing = NotificationTiming::compute(
            NotificationType::DayBefore,
            ticket.sale_start_at.unwrap(),
            Tokyo,
        );
        let active =
            Notification::new(ticket.id.clone(), NotificationType::DayBefore, timing.scheduled_at, now);

        let timings = compute_required_timings(&ticket, &[active.clone()], Tokyo, now);
        assert_eq!(
            timings.iter().map(|t| t.notification_type).collect::<Vec<_>>(),
            vec![NotificationType::HourBefore, NotificationType::MinutesBefore]
        );

        // A cancelled one no longer covers the type
        let cancelled = active.transition(NotificationEvent::Cancel { at: now }).unwrap();
        let timings = compute_required_timings(&ticket, &[cancelled], Tokyo, now);
        assert_eq!(timings.len(), 3);
    }

    #[test]
    fn unknown_sale_start_needs_nothing() {
        let mut ticket = ticket();
        ticket.sale_start_at = None;
        assert!(compute_required_timings(&ticket, &[], Tokyo, 0).is_empty());
    }
}
