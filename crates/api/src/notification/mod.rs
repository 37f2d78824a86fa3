pub mod cancel_notifications;
pub mod process_pending;
pub mod rearm_notification;
pub mod schedule_notifications;
pub mod send_notification;
pub mod sync_ticket_notifications;

use actix_web::web;
use process_pending::process_pending_controller;
use rearm_notification::rearm_notification_controller;
use send_notification::notification_callback_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/notifications/callback",
        web::post().to(notification_callback_controller),
    );
    cfg.route(
        "/notifications/process-pending",
        web::post().to(process_pending_controller),
    );
    cfg.route(
        "/notifications/{notification_id}/rearm",
        web::post().to(rearm_notification_controller),
    );
}
