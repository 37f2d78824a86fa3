use crate::notification::process_pending::ProcessPendingNotificationsUseCase;
use crate::shared::usecase::execute;
use crate::ticket::cleanup_tickets::CleanupTicketsUseCase;
use actix_web::rt::time::{interval, sleep};
use awaytix_infra::Context;
use std::time::Duration;

pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Minutely sweep for scheduled notifications the task queue failed to
/// deliver. Aligned to minute boundaries so the sweep window lines up
/// with the timing policy's instants.
pub fn start_pending_notifications_job(ctx: Context) {
    actix_web::rt::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        sleep(Duration::from_secs(secs_to_next_run as u64)).await;

        let mut minutely_interval = interval(Duration::from_secs(60));
        loop {
            minutely_interval.tick().await;
            let _ = execute(ProcessPendingNotificationsUseCase, &ctx).await;
        }
    });
}

/// Daily retention cleanup of tickets whose match is long past
pub fn start_ticket_retention_job(ctx: Context) {
    actix_web::rt::spawn(async move {
        let mut daily_interval = interval(Duration::from_secs(60 * 60 * 24));
        loop {
            daily_interval.tick().await;
            let _ = execute(CleanupTicketsUseCase, &ctx).await;
        }
    });
}
