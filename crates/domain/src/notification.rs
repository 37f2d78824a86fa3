use crate::shared::entity::{Entity, ID};
use crate::ticket::Ticket;
use chrono::prelude::*;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// A failed notification may only be re-armed while its target instant
/// is at most this far in the past.
const REARM_GRACE_MILLIS: i64 = 1000 * 60 * 60 * 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DayBefore,
    HourBefore,
    MinutesBefore,
}

impl NotificationType {
    pub const ALL: [NotificationType; 3] = [
        NotificationType::DayBefore,
        NotificationType::HourBefore,
        NotificationType::MinutesBefore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayBefore => "day_before",
            Self::HourBefore => "hour_before",
            Self::MinutesBefore => "minutes_before",
        }
    }
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum InvalidNotificationTypeError {
    #[error("Notification type: {0} is not recognized")]
    Unrecognized(String),
}

impl FromStr for NotificationType {
    type Err = InvalidNotificationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day_before" => Ok(Self::DayBefore),
            "hour_before" => Ok(Self::HourBefore),
            "minutes_before" => Ok(Self::MinutesBefore),
            _ => Err(InvalidNotificationTypeError::Unrecognized(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum InvalidNotificationStatusError {
    #[error("Notification status: {0} is not recognized")]
    Unrecognized(String),
}

impl FromStr for NotificationStatus {
    type Err = InvalidNotificationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(InvalidNotificationStatusError::Unrecognized(s.to_string())),
        }
    }
}

/// One scheduled/sent/failed/cancelled reminder for a `Ticket` and a
/// `NotificationType`. At most one non-cancelled `Notification` exists
/// per (ticket, type).
///
/// `scheduled_at` is derived from the owning ticket's sale start by the
/// timing policy when the notification is created and never mutated; a
/// timing change means cancelling this notification and creating a new
/// one.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: ID,
    pub ticket_id: ID,
    pub notification_type: NotificationType,
    pub scheduled_at: i64,
    pub sent_at: Option<i64>,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub external_task_id: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl Entity for Notification {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Events a `Notification` can react to. State changes only happen
/// through `Notification::transition`.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Delivered { sent_at: i64 },
    DeliveryFailed { error: String, at: i64 },
    Rearm { at: i64 },
    Cancel { at: i64 },
}

impl NotificationEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::DeliveryFailed { .. } => "delivery_failed",
            Self::Rearm { .. } => "rearm",
            Self::Cancel { .. } => "cancel",
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Notification in status {from} cannot accept event {event}")]
pub struct IllegalTransitionError {
    pub from: NotificationStatus,
    pub event: &'static str,
}

impl Notification {
    pub fn new(ticket_id: ID, notification_type: NotificationType, scheduled_at: i64, now: i64) -> Self {
        Self {
            id: Default::default(),
            ticket_id,
            notification_type,
            scheduled_at,
            sent_at: None,
            status: NotificationStatus::Scheduled,
            error_message: None,
            external_task_id: None,
            created: now,
            updated: now,
        }
    }

    pub fn with_external_task_id(mut self, external_task_id: String) -> Self {
        self.external_task_id = Some(external_task_id);
        self
    }

    /// Non-cancelled notifications block scheduling another one of the
    /// same type for the same ticket.
    pub fn is_active(&self) -> bool {
        self.status != NotificationStatus::Cancelled
    }

    /// Sweep predicate: a scheduled notification whose target instant
    /// is at most `window_millis` away (or already passed).
    pub fn can_be_sent(&self, now: i64, window_millis: i64) -> bool {
        self.status == NotificationStatus::Scheduled && self.scheduled_at - now <= window_millis
    }

    /// Applies `event`, returning the successor notification. Terminal
    /// states (`sent`, `cancelled`) reject every event.
    pub fn transition(self, event: NotificationEvent) -> Result<Notification, IllegalTransitionError> {
        use NotificationStatus::*;

        let from = self.status;
        match (from, event) {
            (Scheduled, NotificationEvent::Delivered { sent_at }) => Ok(Notification {
                status: Sent,
                sent_at: Some(sent_at),
                error_message: None,
                updated: sent_at,
                ..self
            }),
            (Scheduled, NotificationEvent::DeliveryFailed { error, at }) => Ok(Notification {
                status: Failed,
                error_message: Some(error),
                updated: at,
                ..self
            }),
            (Failed, NotificationEvent::Rearm { at }) => {
                if at > self.scheduled_at + REARM_GRACE_MILLIS {
                    return Err(IllegalTransitionError {
                        from,
                        event: "rearm (expired)",
                    });
                }
                Ok(Notification {
                    status: Scheduled,
                    error_message: None,
                    updated: at,
                    ..self
                })
            }
            (Scheduled, NotificationEvent::Cancel { at })
            | (Failed, NotificationEvent::Cancel { at }) => Ok(Notification {
                status: Cancelled,
                updated: at,
                ..self
            }),
            (from, event) => Err(IllegalTransitionError {
                from,
                event: event.name(),
            }),
        }
    }
}

/// Channel-agnostic rendering of a notification. Channels decide how to
/// put this on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub ticket_url: Option<String>,
}

impl NotificationMessage {
    pub fn new(ticket: &Ticket, notification_type: NotificationType, timezone: Tz) -> Self {
        let lead_time = match notification_type {
            NotificationType::DayBefore => "tomorrow",
            NotificationType::HourBefore => "in 1 hour",
            NotificationType::MinutesBefore => "in 15 minutes",
        };
        let title = format!("Away tickets for {} go on sale {}", ticket.match_name, lead_time);
        let body = match ticket
            .sale_start_at
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            Some(sale_start) => format!(
                "Sale starts {}",
                sale_start.with_timezone(&timezone).format("%Y-%m-%d %H:%M %Z")
            ),
            None => "Sale start time to be announced".into(),
        };
        Self {
            title,
            body,
            ticket_url: ticket.ticket_url.clone(),
        }
    }
}
