//! Calendar window policies
//!
//! Two timezone conventions are in play, and both are deliberate: chart
//! bucketing works in the fixed reporting timezone (UTC+5:30), while the
//! insight engine compares plain calendar months in the server convention
//! (UTC). Storage and query boundaries are always UTC instants; only the
//! choice of which calendar day/month an instant belongs to differs.
//!
//! Every window computation takes an explicit `now` and zone, so callers
//! control the clock and results are deterministic.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};

/// Fixed reporting timezone (UTC+5:30) used for calendar-day bucketing
pub fn reporting_zone() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

/// Server calendar convention used by the insight engine's month windows
pub fn server_zone() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// The month before the given one
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// The month after the given one
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Number of calendar days in a month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = next_month(year, month);
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let next = NaiveDate::from_ymd_opt(ny, nm, 1).unwrap();
    next.signed_duration_since(first).num_days() as u32
}

/// Full English month name (1-based)
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

/// Half-open UTC window `[start, end)` covering the calendar month that
/// `now` falls in under the given zone
pub fn month_window(now: DateTime<Utc>, zone: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local = now.with_timezone(&zone);
    window_for_month(local.year(), local.month(), zone)
}

/// Half-open UTC window for the calendar month before the one `now` falls
/// in under the given zone
pub fn previous_month_window(
    now: DateTime<Utc>,
    zone: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let local = now.with_timezone(&zone);
    let (y, m) = previous_month(local.year(), local.month());
    window_for_month(y, m, zone)
}

/// Half-open UTC window for a specific calendar month in the given zone
pub fn window_for_month(
    year: i32,
    month: u32,
    zone: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let (ny, nm) = next_month(year, month);
    (month_start(year, month, zone), month_start(ny, nm, zone))
}

fn month_start(year: i32, month: u32, zone: FixedOffset) -> DateTime<Utc> {
    let local = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    // A fixed offset maps every local time to exactly one instant
    zone.from_local_datetime(&local)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn test_previous_month_wraps_year() {
        assert_eq!(previous_month(2023, 1), (2022, 12));
        assert_eq!(previous_month(2023, 7), (2023, 6));
    }

    #[test]
    fn test_month_window_server_zone_is_utc_calendar() {
        let (start, end) = month_window(utc(2023, 6, 15, 10, 0), server_zone());
        assert_eq!(start, utc(2023, 6, 1, 0, 0));
        assert_eq!(end, utc(2023, 7, 1, 0, 0));
    }

    #[test]
    fn test_month_window_reporting_zone_shifts_boundary() {
        // Midnight June 1 in UTC+5:30 is 18:30 May 31 in UTC
        let (start, end) = month_window(utc(2023, 6, 15, 10, 0), reporting_zone());
        assert_eq!(start, utc(2023, 5, 31, 18, 30));
        assert_eq!(end, utc(2023, 6, 30, 18, 30));
    }

    #[test]
    fn test_month_membership_differs_between_zones() {
        // 19:00 UTC on May 31 is already June 1 in the reporting zone
        let now = utc(2023, 5, 31, 19, 0);
        let (server_start, _) = month_window(now, server_zone());
        let (reporting_start, _) = month_window(now, reporting_zone());
        assert_eq!(server_start, utc(2023, 5, 1, 0, 0));
        assert_eq!(reporting_start, utc(2023, 5, 31, 18, 30));
    }

    #[test]
    fn test_previous_month_window_across_year_boundary() {
        let (start, end) = previous_month_window(utc(2023, 1, 10, 0, 0), server_zone());
        assert_eq!(start, utc(2022, 12, 1, 0, 0));
        assert_eq!(end, utc(2023, 1, 1, 0, 0));
    }
}
