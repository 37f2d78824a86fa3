use crate::notification::NotificationType;
use chrono::prelude::*;
use chrono::Duration;
use chrono_tz::Tz;

/// Wall-clock hour (site-local) for the day-before reminder.
const DAY_BEFORE_EVENING_HOUR: u32 = 20;

/// When a single notification instant is due, computed from the owning
/// ticket's sale start by the timing policy. All instants are unix
/// millis (UTC); the wall-clock day-before target is resolved through
/// the site's timezone so it stays correct across DST offset changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationTiming {
    pub notification_type: NotificationType,
    pub scheduled_at: i64,
    pub tolerance_millis: i64,
}

impl NotificationTiming {
    pub fn compute(notification_type: NotificationType, sale_start_at: i64, timezone: Tz) -> Self {
        let scheduled_at = match notification_type {
            NotificationType::DayBefore => day_before_at_evening(sale_start_at, timezone),
            NotificationType::HourBefore => sale_start_at - 1000 * 60 * 60,
            NotificationType::MinutesBefore => sale_start_at - 1000 * 60 * 15,
        };
        let tolerance_millis = match notification_type {
            NotificationType::MinutesBefore => 1000 * 60 * 2,
            _ => 1000 * 60 * 5,
        };
        Self {
            notification_type,
            scheduled_at,
            tolerance_millis,
        }
    }

    /// Whether `now` falls inside the tolerance window around the
    /// target instant.
    pub fn is_due(&self, now: i64) -> bool {
        (now - self.scheduled_at).abs() <= self.tolerance_millis
    }
}

/// The calendar day before the sale start, at 20:00 site-local time.
/// The target is a wall-clock instant, so it is resolved through the
/// timezone rather than by subtracting a fixed offset.
fn day_before_at_evening(sale_start_at: i64, timezone: Tz) -> i64 {
    let sale_start = match DateTime::<Utc>::from_timestamp_millis(sale_start_at) {
        Some(sale_start) => sale_start.with_timezone(&timezone),
        // Timestamp outside chrono's range, fall back to a plain day offset
        None => return sale_start_at - 1000 * 60 * 60 * 24,
    };
    let target_day = sale_start.date_naive() - Duration::days(1);
    let target = target_day.and_hms_opt(DAY_BEFORE_EVENING_HOUR, 0, 0).unwrap();
    resolve_local(timezone, target).timestamp_millis()
}

/// Maps a civil datetime to an instant. In a DST fold the earlier
/// instant wins; in a gap the target shifts forward to the next valid
/// wall-clock time.
fn resolve_local(timezone: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match timezone.from_local_datetime(&local) {
        chrono::LocalResult::Single(instant) => instant,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => timezone
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| timezone.from_utc_datetime(&local)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Tokyo;

    fn tokyo_millis(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        Tokyo
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn day_before_targets_evening_regardless_of_sale_time_of_day() {
        for sale_hour in [0, 9, 12, 20, 23] {
            let sale_start_at = tokyo_millis(2025, 3, 15, sale_hour, 0);
            let timing =
                NotificationTiming::compute(NotificationType::DayBefore, sale_start_at, Tokyo);
            assert_eq!(timing.scheduled_at, tokyo_millis(2025, 3, 14, 20, 0));
        }
    }

    #[test]
    fn hour_and_minutes_before_are_fixed_offsets() {
        let sale_start_at = tokyo_millis(2025, 3, 15, 10, 0);

        let hour = NotificationTiming::compute(NotificationType::HourBefore, sale_start_at, Tokyo);
        assert_eq!(hour.scheduled_at, tokyo_millis(2025, 3, 15, 9, 0));

        let minutes =
            NotificationTiming::compute(NotificationType::MinutesBefore, sale_start_at, Tokyo);
        assert_eq!(minutes.scheduled_at, tokyo_millis(2025, 3, 15, 9, 45));
    }

    #[test]
    fn day_before_stays_on_the_wall_clock_across_dst() {
        // 2025-03-09 is the US spring-forward date; the evening before
        // the sale is already on the new offset.
        let sale_start_at = New_York
            .with_ymd_and_hms(2025, 3, 10, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        let timing =
            NotificationTiming::compute(NotificationType::DayBefore, sale_start_at, New_York);
        let expected = New_York
            .with_ymd_and_hms(2025, 3, 9, 20, 0, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(timing.scheduled_at, expected);
    }

    #[test]
    fn is_due_flips_exactly_at_the_tolerance_boundary() {
        let sale_start_at = tokyo_millis(2025, 3, 15, 10, 0);
        for notification_type in NotificationType::ALL {
            let timing = NotificationTiming::compute(notification_type, sale_start_at, Tokyo);
            assert!(timing.is_due(timing.scheduled_at));
            assert!(timing.is_due(timing.scheduled_at + timing.tolerance_millis));
            assert!(timing.is_due(timing.scheduled_at - timing.tolerance_millis));
            assert!(!timing.is_due(timing.scheduled_at + timing.tolerance_millis + 1));
            assert!(!timing.is_due(timing.scheduled_at - timing.tolerance_millis - 1));
        }
    }

    #[test]
    fn day_before_due_window_scenario() {
        // Sale starts 2025-03-15T10:00+09:00, so the day-before
        // reminder fires at 2025-03-14T20:00+09:00.
        let sale_start_at = tokyo_millis(2025, 3, 15, 10, 0);
        let timing = NotificationTiming::compute(NotificationType::DayBefore, sale_start_at, Tokyo);

        assert!(timing.is_due(tokyo_millis(2025, 3, 14, 20, 3)));
        assert!(!timing.is_due(tokyo_millis(2025, 3, 14, 20, 10)));
    }
}
