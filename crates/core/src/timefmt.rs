use chrono::{Local, TimeZone};

const MINUTE_MS: i64 = 60 * 1000;

/// Relative age of a history timestamp: "Just now", "5 min ago", "3h ago",
/// or the local clock time once it is a day old.
pub fn format_age(now_ms: i64, ts_ms: i64) -> String {
    let minutes = now_ms.saturating_sub(ts_ms).max(0) / MINUTE_MS;
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if minutes / 60 < 24 {
        format!("{}h ago", minutes / 60)
    } else {
        match Local.timestamp_millis_opt(ts_ms).single() {
            Some(dt) => dt.format("%H:%M").to_string(),
            None => "--:--".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_buckets() {
        let now = 10 * 24 * 60 * MINUTE_MS;
        assert_eq!(format_age(now, now), "Just now");
        assert_eq!(format_age(now, now + 5_000), "Just now");
        assert_eq!(format_age(now, now - 59_999), "Just now");
        assert_eq!(format_age(now, now - 5 * MINUTE_MS), "5 min ago");
        assert_eq!(format_age(now, now - 59 * MINUTE_MS), "59 min ago");
        assert_eq!(format_age(now, now - 60 * MINUTE_MS), "1h ago");
        assert_eq!(format_age(now, now - 23 * 60 * MINUTE_MS - 59 * MINUTE_MS), "23h ago");
    }

    #[test]
    fn day_old_entries_show_clock_time() {
        let now = 10 * 24 * 60 * MINUTE_MS;
        let s = format_age(now, now - 2 * 24 * 60 * MINUTE_MS);
        assert_eq!(s.len(), 5);
        assert_eq!(&s[2..3], ":");
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let now = 10 * 24 * 60 * MINUTE_MS;
        assert_eq!(format_age(now, i64::MAX), "Just now");
        assert_eq!(format_age(i64::MIN, i64::MAX), "Just now");
        assert_eq!(format_age(now, i64::MIN), "--:--");
        assert_eq!(format_age(i64::MAX, i64::MIN), "--:--");
    }
}
