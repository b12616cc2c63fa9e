//! Time formatting for API timestamps and the location's local clock.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

const LOCAL_MINUTE: &str = "%Y-%m-%dT%H:%M";

fn parse_local(iso: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(iso, LOCAL_MINUTE)
        .or_else(|_| NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// "2024-06-01T15:00" -> "15:00". Unparseable input is returned as-is.
pub fn hour_label(iso: &str) -> String {
    parse_local(iso)
        .map(|dt| dt.format("%H:00").to_string())
        .unwrap_or_else(|| iso.to_string())
}

/// "2024-06-01T05:01" -> "05:01"; "--:--" when missing or unparseable.
pub fn clock_label(iso: Option<&str>) -> String {
    iso.and_then(parse_local)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Weekday abbreviation for a "YYYY-MM-DD" date.
pub fn day_name(date: &str) -> Option<&'static str> {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| DAYS[d.weekday().num_days_from_monday() as usize])
}

/// Wall-clock reading in a location's timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalClock {
    /// "14:05:09"
    pub time: String,
    /// "Saturday, Jun 1"
    pub date: String,
}

impl LocalClock {
    /// `None` when `timezone` is not an IANA name.
    pub fn at(timezone: &str, now: DateTime<Utc>) -> Option<Self> {
        let tz: Tz = timezone.parse().ok()?;
        let local = now.with_timezone(&tz);
        Some(Self {
            time: local.format("%H:%M:%S").to_string(),
            date: local.format("%A, %b %-d").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn hour_label_truncates_minutes() {
        assert_eq!(hour_label("2024-06-01T15:00"), "15:00");
        assert_eq!(hour_label("2024-06-01T07:30"), "07:00");
        assert_eq!(hour_label("not a time"), "not a time");
    }

    #[test]
    fn clock_label_handles_missing() {
        assert_eq!(clock_label(Some("2024-06-01T05:01")), "05:01");
        assert_eq!(clock_label(None), "--:--");
        assert_eq!(clock_label(Some("garbage")), "--:--");
    }

    #[test]
    fn day_names_follow_calendar() {
        assert_eq!(day_name("2024-06-01"), Some("Sat"));
        assert_eq!(day_name("2024-06-03"), Some("Mon"));
        assert_eq!(day_name("06/03/2024"), None);
    }

    #[test]
    fn local_clock_applies_timezone() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 9).unwrap();

        let berlin = LocalClock::at("Europe/Berlin", now).expect("valid tz");
        assert_eq!(berlin.time, "14:05:09");
        assert_eq!(berlin.date, "Saturday, Jun 1");

        assert!(LocalClock::at("Mars/Olympus", now).is_none());
    }
}
