pub mod cleanup_tickets;
mod delete_ticket;
mod get_ticket;
mod get_ticket_notifications;
pub mod ingest_ticket;
mod list_tickets;
mod subscribers;

use actix_web::web;
use delete_ticket::delete_ticket_controller;
use get_ticket::get_ticket_controller;
use get_ticket_notifications::get_ticket_notifications_controller;
use ingest_ticket::ingest_ticket_controller;
use list_tickets::list_tickets_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/tickets/ingest", web::post().to(ingest_ticket_controller));
    cfg.route("/tickets", web::get().to(list_tickets_controller));
    cfg.route("/tickets/{ticket_id}", web::get().to(get_ticket_controller));
    cfg.route(
        "/tickets/{ticket_id}",
        web::delete().to(delete_ticket_controller),
    );
    cfg.route(
        "/tickets/{ticket_id}/notifications",
        web::get().to(get_ticket_notifications_controller),
    );
}
