//! Today's window and record selection

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::projections::parse_date;
use crate::store::HealthMetricRecord;

/// Half-open interval `[start, end)` covering one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The calendar day containing `now`, in `now`'s timezone
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let date = now.date_naive();
        let next = date.succ_opt().unwrap_or(NaiveDate::MAX);

        Self {
            start: local_midnight(&tz, date),
            end: local_midnight(&tz, next),
        }
    }

    /// Check whether a timestamp falls inside the window
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts < self.end
    }
}

/// First instant of `date` in `tz`
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt.with_timezone(&Utc);
    }

    // Midnight skipped by a DST jump; the day starts at the first valid hour
    (1..=3)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Outcome of picking today's record out of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index of the first record dated inside the window
    Today(usize),
    /// Nothing dated today; the first record stands in
    MostRecent,
    /// The result set was empty
    Empty,
}

/// Find today's record, falling back to the first one
pub fn select_today(records: &[HealthMetricRecord], window: &DayWindow) -> Selection {
    if records.is_empty() {
        return Selection::Empty;
    }

    records
        .iter()
        .position(|r| {
            parse_date(r.date.as_ref())
                .map(|ts| window.contains(&ts))
                .unwrap_or(false)
        })
        .map(Selection::Today)
        .unwrap_or(Selection::MostRecent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDateTime};

    /// Zone that springs forward from UTC-3 to UTC-2 at local midnight on
    /// 2026-10-18, so 00:00..01:00 that day does not exist
    #[derive(Debug, Clone, Copy)]
    struct MidnightShift;

    impl MidnightShift {
        fn transition() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::west_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for MidnightShift {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            MidnightShift
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(12, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_end = Self::transition() + Duration::hours(1);
            if *local < Self::transition() {
                LocalResult::Single(Self::before())
            } else if *local < gap_end {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            // Transition instant is 03:00 UTC
            if *utc < Self::transition() + Duration::hours(3) {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_window_uses_local_midnight() {
        let now = at("2026-10-16T15:00:00-05:00");
        let window = DayWindow::today(&now);

        assert_eq!(window.start.to_rfc3339(), "2026-10-16T05:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2026-10-17T05:00:00+00:00");
    }

    #[test]
    fn test_window_when_midnight_is_skipped() {
        let noon = MidnightShift.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        );
        let window = DayWindow::today(&noon);

        // Day starts at the first valid local time, 01:00 at UTC-2
        assert_eq!(window.start.to_rfc3339(), "2026-10-18T03:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2026-10-19T02:00:00+00:00");
        assert_eq!(window.end - window.start, Duration::hours(23));
    }

    #[test]
    fn test_window_day_before_shift() {
        let evening = MidnightShift.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2026, 10, 17)
                .unwrap()
                .and_hms_opt(22, 0, 0)
                .unwrap(),
        );
        let window = DayWindow::today(&evening);

        assert_eq!(window.start.to_rfc3339(), "2026-10-17T03:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2026-10-18T03:00:00+00:00");
    }

    #[test]
    fn test_window_is_half_open() {
        let window = DayWindow::today(&at("2026-10-16T12:00:00+00:00"));

        assert!(window.contains(&window.start));
        assert!(!window.contains(&window.end));
        assert!(window.contains(&(window.end - Duration::milliseconds(1))));
    }

    #[test]
    fn test_select_empty() {
        let window = DayWindow::today(&at("2026-10-16T12:00:00+00:00"));
        assert_eq!(select_today(&[], &window), Selection::Empty);
    }

    #[test]
    fn test_select_today_among_others() {
        let window = DayWindow::today(&at("2026-10-16T12:00:00+00:00"));
        let records = vec![
            HealthMetricRecord::new().date("2026-10-15T09:00:00Z"),
            HealthMetricRecord::new(),
            HealthMetricRecord::new().date("2026-10-16T06:30:00Z"),
            HealthMetricRecord::new().date("2026-10-16T08:00:00Z"),
        ];

        assert_eq!(select_today(&records, &window), Selection::Today(2));
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let window = DayWindow::today(&at("2026-10-16T12:00:00+00:00"));
        let records = vec![
            HealthMetricRecord::new().date("2026-10-14T09:00:00Z"),
            HealthMetricRecord::new().date("garbage"),
            HealthMetricRecord::new().date("2026-10-17T00:00:00Z"),
        ];

        assert_eq!(select_today(&records, &window), Selection::MostRecent);
    }
}
