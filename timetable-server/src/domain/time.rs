//! Clock time handling for the layout timetable.
//!
//! The timetable runs on a 24-hour model clock with minute granularity.
//! Times are stored as "minute of day" and wrap at midnight; intervals that
//! cross midnight are handled by [`TimeWindow`], which normalises them onto
//! a two-day axis before comparing.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in one day of model time.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day on the model clock, to the minute.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::ClockTime;
/// use chrono::Duration;
///
/// let t = ClockTime::parse_hhmm("23:30").unwrap();
/// assert_eq!(t.to_string(), "23:30");
///
/// // Adding wraps around midnight
/// assert_eq!((t + Duration::minutes(45)).to_string(), "00:15");
///
/// // ...unless you ask for a same-day result
/// assert!(t.checked_add_same_day(Duration::minutes(45)).is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Midnight, 00:00.
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Create a time from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self((hour * 60 + minute) as u16))
    }

    /// Create a time from minutes since midnight (0..1440).
    pub fn from_minute_of_day(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes as u16))
    }

    /// Create a time from any minute count, wrapping into a single day.
    pub fn wrapping_from_minutes(minutes: i64) -> Self {
        Self(minutes.rem_euclid(MINUTES_PER_DAY as i64) as u16)
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// "HH:MM:SS" is accepted as well, the seconds are dropped: the timetable
    /// only has minute precision.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::ClockTime;
    ///
    /// assert!(ClockTime::parse_hhmm("00:00").is_ok());
    /// assert!(ClockTime::parse_hhmm("23:59").is_ok());
    /// assert_eq!(ClockTime::parse_hhmm("08:05:59").unwrap().to_string(), "08:05");
    ///
    /// assert!(ClockTime::parse_hhmm("0805").is_err());
    /// assert!(ClockTime::parse_hhmm("8:05").is_err());
    /// assert!(ClockTime::parse_hhmm("24:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        match bytes.len() {
            5 => {}
            8 => {
                if bytes[5] != b':' {
                    return Err(TimeError::new("expected colon at position 5"));
                }
                let second = parse_two_digits(&bytes[6..8])
                    .ok_or_else(|| TimeError::new("invalid second digits"))?;
                if second > 59 {
                    return Err(TimeError::new("second must be 0-59"));
                }
            }
            _ => return Err(TimeError::new("expected HH:MM format")),
        }

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.0 as u32 / 60
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.0 as u32 % 60
    }

    /// Returns minutes since midnight.
    pub fn minute_of_day(&self) -> u32 {
        self.0 as u32
    }

    /// Converts to a chrono `NaiveTime`.
    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    /// Converts from a chrono `NaiveTime`, dropping seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    /// Add a duration without wrapping past midnight.
    ///
    /// Returns `None` when the result would fall on the next (or previous) day.
    pub fn checked_add_same_day(&self, duration: Duration) -> Option<Self> {
        let total = self.0 as i64 + duration.num_minutes();
        if (0..MINUTES_PER_DAY as i64).contains(&total) {
            Some(Self(total as u16))
        } else {
            None
        }
    }

    /// Subtract a duration, wrapping around midnight.
    pub fn wrapping_sub(&self, duration: Duration) -> Self {
        Self::wrapping_from_minutes(self.0 as i64 - duration.num_minutes())
    }

    /// Signed minutes from `other` to `self` on the same day.
    ///
    /// Negative when `other` is later in the day than `self`.
    pub fn signed_minutes_since(&self, other: Self) -> i64 {
        self.0 as i64 - other.0 as i64
    }

    /// Minutes from `other` forward to `self`, going past midnight if needed.
    pub fn forward_minutes_since(&self, other: Self) -> u32 {
        (self.0 as i64 - other.0 as i64).rem_euclid(MINUTES_PER_DAY as i64) as u32
    }
}

impl Add<Duration> for ClockTime {
    type Output = Self;

    /// Adds a duration, wrapping around midnight.
    fn add(self, rhs: Duration) -> Self::Output {
        Self::wrapping_from_minutes(self.0 as i64 + rhs.num_minutes())
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hhmm(&value)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// A half-open interval `[start, end)` on the model clock.
///
/// When `end` is earlier than `start` the window crosses midnight and its
/// end is read as belonging to the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeWindow {
    /// Create a window from its bounds.
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Returns true if the window runs past midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Start and end as minutes on a two-day axis (`end >= start`).
    fn normalized(&self) -> (u32, u32) {
        let start = self.start.minute_of_day();
        let mut end = self.end.minute_of_day();
        if end < start {
            end += MINUTES_PER_DAY;
        }
        (start, end)
    }

    /// Length of the window in minutes.
    pub fn len_minutes(&self) -> u32 {
        let (start, end) = self.normalized();
        end - start
    }

    /// Returns true if the two windows share any instant.
    ///
    /// Windows that merely touch (`a.end == b.start`) do not overlap. The
    /// relation is symmetric.
    ///
    /// # Examples
    ///
    /// ```
    /// use timetable_server::domain::{ClockTime, TimeWindow};
    ///
    /// let w = |a: &str, b: &str| TimeWindow::new(
    ///     ClockTime::parse_hhmm(a).unwrap(),
    ///     ClockTime::parse_hhmm(b).unwrap(),
    /// );
    ///
    /// assert!(w("08:00", "08:30").overlaps(&w("08:15", "08:45")));
    /// assert!(!w("08:00", "08:30").overlaps(&w("08:30", "09:00")));
    /// assert!(w("23:50", "00:10").overlaps(&w("23:55", "00:05")));
    /// ```
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.overlap(other).is_some()
    }

    /// The shared part of two windows, if any.
    pub fn overlap(&self, other: &TimeWindow) -> Option<TimeWindow> {
        let (s1, e1) = self.normalized();
        let (s2, e2) = other.normalized();

        // A window ending after midnight may meet an early-morning window of
        // the other train, so also compare with either side shifted a day.
        let shifts = [(0, 0), (0, MINUTES_PER_DAY), (MINUTES_PER_DAY, 0)];

        shifts.iter().find_map(|&(d1, d2)| {
            let (s1, e1) = (s1 + d1, e1 + d1);
            let (s2, e2) = (s2 + d2, e2 + d2);
            if s1 < e2 && s2 < e1 {
                Some(TimeWindow::new(
                    ClockTime::wrapping_from_minutes(s1.max(s2) as i64),
                    ClockTime::wrapping_from_minutes(e1.min(e2) as i64),
                ))
            } else {
                None
            }
        })
    }

    /// Returns true if `t` lies inside the half-open window `[start, end)`.
    pub fn contains(&self, t: ClockTime) -> bool {
        t.forward_minutes_since(self.start) < self.len_minutes()
    }

    /// Returns true if `t` lies inside the closed window `[start, end]`.
    pub fn contains_inclusive(&self, t: ClockTime) -> bool {
        t.forward_minutes_since(self.start) <= self.len_minutes()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

/// Returns true if `[start1, end1)` and `[start2, end2)` overlap.
pub fn times_overlap(start1: ClockTime, end1: ClockTime, start2: ClockTime, end2: ClockTime) -> bool {
    TimeWindow::new(start1, end1).overlaps(&TimeWindow::new(start2, end2))
}

impl PartialOrd for TimeWindow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeWindow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.len_minutes().cmp(&other.len_minutes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse_hhmm(s).unwrap()
    }

    fn w(a: &str, b: &str) -> TimeWindow {
        TimeWindow::new(t(a), t(b))
    }

    #[test]
    fn parse_valid_times() {
        let time = t("00:00");
        assert_eq!(time.hour(), 0);
        assert_eq!(time.minute(), 0);

        let time = t("23:59");
        assert_eq!(time.hour(), 23);
        assert_eq!(time.minute(), 59);

        let time = t("14:30");
        assert_eq!(time.minute_of_day(), 870);
    }

    #[test]
    fn parse_with_seconds() {
        assert_eq!(t("08:05:00"), t("08:05"));
        assert_eq!(t("08:05:59"), t("08:05"));
        assert!(ClockTime::parse_hhmm("08:05:60").is_err());
        assert!(ClockTime::parse_hhmm("08:05-00").is_err());
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ClockTime::parse_hhmm("1430").is_err());
        assert!(ClockTime::parse_hhmm("14:3").is_err());
        assert!(ClockTime::parse_hhmm("14:300").is_err());
        assert!(ClockTime::parse_hhmm("14-30").is_err());
        assert!(ClockTime::parse_hhmm("ab:cd").is_err());
        assert!(ClockTime::parse_hhmm("").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ClockTime::parse_hhmm("24:00").is_err());
        assert!(ClockTime::parse_hhmm("12:60").is_err());
    }

    #[test]
    fn add_wraps_midnight() {
        assert_eq!(t("10:30") + Duration::minutes(45), t("11:15"));
        assert_eq!(t("23:30") + Duration::minutes(60), t("00:30"));
        assert_eq!(t("00:10").wrapping_sub(Duration::minutes(20)), t("23:50"));
    }

    #[test]
    fn checked_add_same_day_rejects_rollover() {
        assert_eq!(
            t("22:00").checked_add_same_day(Duration::minutes(119)),
            Some(t("23:59"))
        );
        assert!(t("22:00").checked_add_same_day(Duration::minutes(120)).is_none());
    }

    #[test]
    fn minute_differences() {
        assert_eq!(t("08:30").signed_minutes_since(t("08:00")), 30);
        assert_eq!(t("08:00").signed_minutes_since(t("08:30")), -30);
        assert_eq!(t("00:10").forward_minutes_since(t("23:50")), 20);
    }

    #[test]
    fn naive_time_conversion() {
        let nt = NaiveTime::from_hms_opt(7, 45, 30).unwrap();
        assert_eq!(ClockTime::from_naive_time(nt), t("07:45"));
        assert_eq!(t("07:45").to_naive_time(), NaiveTime::from_hms_opt(7, 45, 0).unwrap());
    }

    #[test]
    fn overlap_cases() {
        assert!(times_overlap(t("08:00"), t("08:30"), t("08:15"), t("08:45")));
        assert!(!times_overlap(t("08:00"), t("08:30"), t("08:30"), t("09:00")));
        assert!(times_overlap(t("23:50"), t("00:10"), t("23:55"), t("00:05")));
    }

    #[test]
    fn overnight_window_meets_early_morning() {
        assert!(w("23:50", "00:10").overlaps(&w("00:05", "00:20")));
        assert!(w("00:05", "00:20").overlaps(&w("23:50", "00:10")));
        assert!(!w("23:50", "00:10").overlaps(&w("00:10", "00:20")));
    }

    #[test]
    fn overlap_window_is_intersection() {
        assert_eq!(w("08:00", "08:12").overlap(&w("08:05", "08:17")), Some(w("08:05", "08:12")));
        assert_eq!(w("23:50", "00:10").overlap(&w("00:05", "00:20")), Some(w("00:05", "00:10")));
        assert_eq!(w("08:00", "08:10").overlap(&w("09:00", "09:10")), None);
    }

    #[test]
    fn inclusive_containment() {
        let window = w("07:45", "08:15");
        assert!(window.contains_inclusive(t("07:45")));
        assert!(window.contains_inclusive(t("08:15")));
        assert!(!window.contains_inclusive(t("08:16")));

        assert!(window.contains(t("07:45")));
        assert!(!window.contains(t("08:15")));

        let overnight = w("23:45", "00:15");
        assert!(overnight.contains(t("00:10")));
        assert!(overnight.contains_inclusive(t("00:00")));
        assert!(overnight.contains_inclusive(t("23:50")));
        assert!(!overnight.contains_inclusive(t("12:00")));
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&t("08:05")).unwrap();
        assert_eq!(json, "\"08:05\"");
        let back: ClockTime = serde_json::from_str("\"08:05:00\"").unwrap();
        assert_eq!(back, t("08:05"));
    }

    #[test]
    fn display_format() {
        assert_eq!(t("09:05").to_string(), "09:05");
        assert_eq!(w("23:50", "00:10").to_string(), "23:50–00:10");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_time()(hour in 0u32..24, minute in 0u32..60) -> String {
            format!("{:02}:{:02}", hour, minute)
        }
    }

    prop_compose! {
        fn any_clock()(m in 0u32..MINUTES_PER_DAY) -> ClockTime {
            ClockTime::from_minute_of_day(m).unwrap()
        }
    }

    proptest! {
        /// Parse then display roundtrips
        #[test]
        fn parse_display_roundtrip(s in valid_time()) {
            let parsed = ClockTime::parse_hhmm(&s).unwrap();
            prop_assert_eq!(parsed.to_string(), s);
        }

        /// Invalid hour is rejected
        #[test]
        fn invalid_hour_rejected(hour in 24u32..100, minute in 0u32..60) {
            let s = format!("{:02}:{:02}", hour, minute);
            prop_assert!(ClockTime::parse_hhmm(&s).is_err());
        }

        /// Adding then subtracting the same duration returns the original
        #[test]
        fn add_sub_identity(time in any_clock(), minutes in 0i64..5000) {
            let d = Duration::minutes(minutes);
            prop_assert_eq!((time + d).wrapping_sub(d), time);
        }

        /// Overlap is commutative
        #[test]
        fn overlap_commutative(a in any_clock(), b in any_clock(), c in any_clock(), d in any_clock()) {
            prop_assert_eq!(times_overlap(a, b, c, d), times_overlap(c, d, a, b));
        }

        /// A non-empty window always overlaps itself
        #[test]
        fn non_empty_window_overlaps_itself(a in any_clock(), len in 1u32..600) {
            let window = TimeWindow::new(a, a + Duration::minutes(len as i64));
            prop_assert!(window.overlaps(&window));
        }

        /// Windows that only touch never overlap
        #[test]
        fn touching_windows_do_not_overlap(a in any_clock(), l1 in 1u32..300, l2 in 1u32..300) {
            let b = a + Duration::minutes(l1 as i64);
            let c = b + Duration::minutes(l2 as i64);
            prop_assert!(!times_overlap(a, b, b, c));
        }
    }
}
