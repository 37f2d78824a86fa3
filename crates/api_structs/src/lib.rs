mod notification;
mod status;
mod ticket;

pub mod dtos {
    pub use crate::notification::dtos::*;
    pub use crate::ticket::dtos::*;
}

pub use crate::notification::api::*;
pub use crate::status::api::*;
pub use crate::ticket::api::*;
