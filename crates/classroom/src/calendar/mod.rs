//! Calendar Integration
//!
//! `CalendarClient` abstracts the timetable backend: Google Calendar in
//! production, an in-memory calendar for development and tests.

mod google;
mod memory;

pub use google::{GoogleCalendarClient, GoogleCalendarConfig};
pub use memory::MemoryCalendar;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use crate::error::{ClassroomError, Result};
use crate::model::CalendarEvent;

/// Calendar client trait (Strategy pattern)
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Events overlapping `[from, to)`, ordered by start time
    async fn events_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<CalendarEvent>>;

    /// Create an event
    async fn insert(
        &self,
        summary: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent>;

    /// First event whose summary equals `summary`, ignoring case
    async fn find_by_summary(&self, summary: &str) -> Result<Option<CalendarEvent>>;

    /// Move an event to new times
    async fn patch_times(
        &self,
        id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent>;

    /// Remove an event
    async fn delete(&self, id: &str) -> Result<()>;

    /// Backend name
    fn name(&self) -> &str;
}

/// India Standard Time, the default school timezone
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or_else(|| Utc.fix())
}

/// Parse an offset such as `+05:30`, `-04:00` or `Z`
pub fn parse_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let invalid = || ClassroomError::Config(format!("invalid UTC offset '{s}'"));
    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..60).contains(&minutes) || hours < 0 {
        return Err(invalid());
    }

    let seconds = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .ok_or_else(invalid)?;
    FixedOffset::east_opt(sign * seconds).ok_or_else(invalid)
}

/// Parse a wall-clock time: `2 PM`, `2:30pm`, `14:00`, `14:00:00`
pub fn parse_clock_time(input: &str) -> Result<NaiveTime> {
    let mut s = input.trim().to_uppercase().replace('.', "");
    if s.is_empty() {
        return Err(ClassroomError::InvalidTime(input.to_string()));
    }

    // "2 PM" -> "2:00 PM", "14" -> "14:00"
    if !s.contains(':') {
        match s.find(|c: char| c == 'A' || c == 'P') {
            Some(idx) => {
                let (hour, suffix) = s.split_at(idx);
                s = format!("{}:00 {}", hour.trim(), suffix.trim());
            }
            None => s.push_str(":00"),
        }
    }

    ["%I:%M %p", "%I:%M%p", "%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&s, fmt).ok())
        .ok_or_else(|| ClassroomError::InvalidTime(input.to_string()))
}

/// Combine a time with a date (today in `offset` when absent).
///
/// A full RFC 3339 timestamp is accepted as-is.
pub fn to_local_datetime(
    time: &str,
    date: Option<NaiveDate>,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(time.trim()) {
        return Ok(dt);
    }

    let clock = parse_clock_time(time)?;
    let day = date.unwrap_or_else(|| Utc::now().with_timezone(&offset).date_naive());

    day.and_time(clock)
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| ClassroomError::InvalidTime(time.to_string()))
}

/// Parse an optional `YYYY-MM-DD` date argument
pub fn parse_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ClassroomError::InvalidTime(s.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_clock_time_variants() {
        let two_pm = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        assert_eq!(parse_clock_time("2 PM").unwrap(), two_pm);
        assert_eq!(parse_clock_time("2pm").unwrap(), two_pm);
        assert_eq!(parse_clock_time("14:00").unwrap(), two_pm);
        assert_eq!(parse_clock_time("2:30 p.m.").unwrap().minute(), 30);
        assert_eq!(parse_clock_time("09:15:00").unwrap().hour(), 9);
        assert_eq!(parse_clock_time("12 AM").unwrap().hour(), 0);
    }

    #[test]
    fn test_parse_clock_time_rejects_garbage() {
        assert!(parse_clock_time("after lunch").is_err());
        assert!(parse_clock_time("").is_err());
        assert!(parse_clock_time("25:00").is_err());
    }

    #[test]
    fn test_to_local_datetime_uses_offset() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 14);
        let dt = to_local_datetime("2 PM", date, ist()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-07-14T14:00:00+05:30");
    }

    #[test]
    fn test_to_local_datetime_accepts_rfc3339() {
        let dt = to_local_datetime("2025-07-14T09:00:00+05:30", None, ist()).unwrap();
        assert_eq!(dt.hour(), 9);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+05:30").unwrap(), ist());
        assert_eq!(parse_offset("-04:00").unwrap().local_minus_utc(), -4 * 3600);
        assert_eq!(parse_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("IST").is_err());
    }

    #[test]
    fn test_parse_offset_out_of_range() {
        assert!(matches!(parse_offset("+9999999"), Err(ClassroomError::Config(_))));
        assert!(matches!(parse_offset("-2147483647:59"), Err(ClassroomError::Config(_))));
        assert!(parse_offset("+25:00").is_err());
        assert!(parse_offset("+05:75").is_err());
        assert!(parse_offset("+-5:00").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(parse_date(Some("")).unwrap(), None);
        assert!(parse_date(Some("2025-07-14")).unwrap().is_some());
        assert!(parse_date(Some("tomorrow")).is_err());
    }
}
