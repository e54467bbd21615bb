//! Lenient timestamp parsing for occurrence start/end values.
//!
//! Producers hand us whatever their feed contained, so a start may be
//! missing, well-formed, or present but garbage. These states are kept
//! apart: filtering treats "garbage" like "missing", sorting treats both as
//! undated. Date-only values stay calendar dates and are never shifted into
//! another zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive date-time layouts accepted in addition to RFC 3339.
/// Naive values are interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parsed state of an occurrence timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTimeState {
    /// The producer supplied no value.
    Absent,
    /// A value was supplied but none of the accepted layouts matched.
    Unparseable(String),
    At(DateTime<Utc>),
    /// All-day value: a calendar date without a time of day.
    Date(NaiveDate),
}

impl EventTimeState {
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return EventTimeState::Absent;
        };

        if let Some(dt) = parse_datetime(raw) {
            return EventTimeState::At(dt);
        }
        match parse_date(raw) {
            Some(date) => EventTimeState::Date(date),
            None => EventTimeState::Unparseable(raw.to_string()),
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, EventTimeState::Unparseable(_))
    }

    /// The instant used for ordering and the future filter.
    ///
    /// All-day values start at midnight UTC of their date.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTimeState::At(dt) => Some(*dt),
            EventTimeState::Date(date) => Some(date_start(*date)),
            EventTimeState::Absent | EventTimeState::Unparseable(_) => None,
        }
    }

    /// Calendar date as seen in `tz`. All-day values keep their own date.
    pub fn local_date<Z: TimeZone>(&self, tz: &Z) -> Option<NaiveDate> {
        match self {
            EventTimeState::At(dt) => Some(dt.with_timezone(tz).date_naive()),
            EventTimeState::Date(date) => Some(*date),
            EventTimeState::Absent | EventTimeState::Unparseable(_) => None,
        }
    }

    /// Whether this value is "now or later" for the future filter.
    ///
    /// Undeterminable values count as upcoming so that malformed data is
    /// over-included rather than silently hidden.
    pub fn is_at_or_after(&self, now: DateTime<Utc>) -> bool {
        match self {
            EventTimeState::At(dt) => *dt >= now,
            EventTimeState::Date(date) => date_start(*date) >= now,
            EventTimeState::Absent | EventTimeState::Unparseable(_) => true,
        }
    }
}

/// Parse a feed timestamp into UTC.
///
/// Accepts RFC 3339, naive ISO date-times, ISO dates (midnight UTC) and the
/// iCalendar basic forms `20250320T150000Z`, `20250320T150000`, `20250320`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    parse_datetime(s).or_else(|| parse_date(s).map(date_start))
}

fn date_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // iCalendar UTC basic form
    if let Some(basic) = s.strip_suffix('Z') {
        if let Ok(naive) = NaiveDateTime::parse_from_str(basic, "%Y%m%dT%H%M%S") {
            return Some(naive.and_utc());
        }
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp("2025-03-20T15:00:00+01:00"),
            Some(utc(2025, 3, 20, 14, 0))
        );
        assert_eq!(
            parse_timestamp("2025-03-20T15:00:00Z"),
            Some(utc(2025, 3, 20, 15, 0))
        );
    }

    #[test]
    fn parses_naive_iso_as_utc() {
        assert_eq!(
            parse_timestamp("2025-03-20T15:00"),
            Some(utc(2025, 3, 20, 15, 0))
        );
        assert_eq!(
            parse_timestamp("2025-03-20 09:30"),
            Some(utc(2025, 3, 20, 9, 30))
        );
    }

    #[test]
    fn parses_all_day_dates_as_midnight() {
        assert_eq!(parse_timestamp("2025-03-20"), Some(utc(2025, 3, 20, 0, 0)));
        assert_eq!(parse_timestamp("20250320"), Some(utc(2025, 3, 20, 0, 0)));
    }

    #[test]
    fn parses_ics_basic_forms() {
        assert_eq!(
            parse_timestamp("20250320T150000Z"),
            Some(utc(2025, 3, 20, 15, 0))
        );
        assert_eq!(
            parse_timestamp("20250320T150000"),
            Some(utc(2025, 3, 20, 15, 0))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("next tuesday-ish"), None);
        assert_eq!(parse_timestamp("2025-13-45"), None);
    }

    #[test]
    fn state_distinguishes_absent_from_unparseable() {
        assert_eq!(EventTimeState::from_raw(None), EventTimeState::Absent);
        assert_eq!(EventTimeState::from_raw(Some("   ")), EventTimeState::Absent);
        assert_eq!(
            EventTimeState::from_raw(Some("soon")),
            EventTimeState::Unparseable("soon".to_string())
        );
        assert_eq!(
            EventTimeState::from_raw(Some("2025-03-20")).instant(),
            Some(utc(2025, 3, 20, 0, 0))
        );
    }

    #[test]
    fn date_only_values_keep_their_calendar_date() {
        let may_first = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
        let state = EventTimeState::from_raw(Some("2030-05-01"));
        assert_eq!(state, EventTimeState::Date(may_first));
        assert_eq!(state.local_date(&chrono_tz::America::New_York), Some(may_first));

        let timed = EventTimeState::from_raw(Some("2030-05-01T00:00:00Z"));
        assert_eq!(
            timed.local_date(&chrono_tz::America::New_York),
            NaiveDate::from_ymd_opt(2030, 4, 30)
        );
    }

    #[test]
    fn future_check_includes_boundary_and_undated() {
        let now = utc(2025, 3, 20, 12, 0);
        assert!(EventTimeState::At(now).is_at_or_after(now));
        assert!(!EventTimeState::At(utc(2025, 3, 20, 11, 59)).is_at_or_after(now));
        assert!(EventTimeState::Absent.is_at_or_after(now));
        assert!(!EventTimeState::Date(now.date_naive()).is_at_or_after(now));
        assert!(EventTimeState::Unparseable("??".into()).is_at_or_after(now));
    }
}
