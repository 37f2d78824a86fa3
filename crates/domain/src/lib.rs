mod notification;
pub mod scheduling;
mod shared;
mod ticket;
mod timing;

pub use notification::{
    IllegalTransitionError, Notification, NotificationEvent, NotificationMessage,
    NotificationStatus, NotificationType,
};
pub use shared::entity::{Entity, ID};
pub use ticket::{InvalidTicketError, SaleStatus, Ticket, TicketFields};
pub use timing::NotificationTiming;
