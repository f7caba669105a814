//! Session clock.
//!
//! Turns the user's mode selection into a [`Session`] with a planned end.
//! All timestamps are local wall-clock time without an offset, which is what
//! the user types in and what the session log records.
//!
//! Two modes are supported:
//!
//! - **Duration**: hours, minutes and seconds added to the start time.
//! - **Until**: a 24-hour `HH:MM` time of day. If that time is not strictly
//!   after the start, it is taken to mean tomorrow.

use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Format used for every timestamp written to the session log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// How the user chose to bound the session, as raw form input.
///
/// Fields are kept as strings so that parsing failures surface as
/// [`ValidationError`]s rather than being rejected earlier by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ModeConfig {
    Duration {
        hours: String,
        minutes: String,
        seconds: String,
    },
    Until {
        time: String,
    },
}

impl ModeConfig {
    pub fn duration(
        hours: impl Into<String>,
        minutes: impl Into<String>,
        seconds: impl Into<String>,
    ) -> Self {
        ModeConfig::Duration {
            hours: hours.into(),
            minutes: minutes.into(),
            seconds: seconds.into(),
        }
    }

    pub fn until(time: impl Into<String>) -> Self {
        ModeConfig::Until { time: time.into() }
    }
}

/// One scheduled play session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    start: NaiveDateTime,
    planned_end: NaiveDateTime,
    mode: String,
}

impl Session {
    pub fn new(start: NaiveDateTime, planned_end: NaiveDateTime, mode: impl Into<String>) -> Self {
        Self {
            start,
            planned_end,
            mode: mode.into(),
        }
    }

    /// Build a session from raw mode input, starting at `start`.
    pub fn from_mode(mode: &ModeConfig, start: NaiveDateTime) -> Result<Self, ValidationError> {
        match mode {
            ModeConfig::Duration {
                hours,
                minutes,
                seconds,
            } => {
                let h = parse_field("hours", hours)?;
                let m = parse_field("minutes", minutes)?;
                let s = parse_field("seconds", seconds)?;
                Self::for_duration(h, m, s, start)
            }
            ModeConfig::Until { time } => Self::until(time, start),
        }
    }

    /// Duration mode: `planned_end = start + h*3600 + m*60 + s`.
    pub fn for_duration(
        hours: u64,
        minutes: u64,
        seconds: u64,
        start: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let total = hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds);
        if total == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        let planned_end = i64::try_from(total)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|d| start.checked_add_signed(d))
            .ok_or(ValidationError::DurationTooLong)?;
        Ok(Self::new(
            start,
            planned_end,
            format!("duration {hours}h {minutes}m {seconds}s"),
        ))
    }

    /// Until mode: today at `HH:MM`, or tomorrow if that is not after `start`.
    pub fn until(time: &str, start: NaiveDateTime) -> Result<Self, ValidationError> {
        let tod = parse_time_of_day(time)?;
        let mut planned_end = start.date().and_time(tod);
        if planned_end <= start {
            planned_end += Duration::days(1);
        }
        Ok(Self::new(
            start,
            planned_end,
            format!("until {}", planned_end.format("%H:%M")),
        ))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn planned_end(&self) -> NaiveDateTime {
        self.planned_end
    }

    /// Human-readable summary of the chosen mode.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Seconds left until the planned end. Negative once it has passed.
    pub fn remaining_secs(&self, now: NaiveDateTime) -> f64 {
        (self.planned_end - now).num_milliseconds() as f64 / 1000.0
    }

    /// Total planned length in seconds.
    pub fn total_secs(&self) -> u64 {
        (self.planned_end - self.start).num_seconds().max(0) as u64
    }
}

/// Parse a duration field. Blank input counts as zero.
fn parse_field(field: &'static str, raw: &str) -> Result<u64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| ValidationError::NotAnInteger {
            field,
            value: raw.to_string(),
        })
}

/// Parse `H:MM` or `HH:MM` (24-hour), surrounding whitespace allowed.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ValidationError> {
    let invalid = || ValidationError::InvalidTimeOfDay(raw.to_string());

    let (hh, mm) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hh) || hh.len() > 2 || !digits(mm) || mm.len() != 2 {
        return Err(invalid());
    }

    let hour: u32 = hh.parse().map_err(|_| invalid())?;
    let minute: u32 = mm.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// `HH:MM:SS` when at least an hour is left, otherwise `MM:SS`.
pub fn format_remaining(secs: u64) -> String {
    let (m, s) = (secs / 60, secs % 60);
    let (h, m) = (m / 60, m % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn duration_mode_adds_total_seconds() {
        let start = at(20, 0, 0);
        let session = Session::from_mode(&ModeConfig::duration("0", "30", "0"), start).unwrap();
        assert_eq!(session.planned_end(), at(20, 30, 0));
        assert_eq!(session.total_secs(), 1800);
        assert_eq!(session.mode(), "duration 0h 30m 0s");
    }

    #[test]
    fn blank_fields_count_as_zero() {
        let session = Session::from_mode(&ModeConfig::duration("", "", "45"), at(9, 0, 0)).unwrap();
        assert_eq!(session.planned_end(), at(9, 0, 45));
    }

    #[test]
    fn non_integer_field_is_rejected() {
        let err = Session::from_mode(&ModeConfig::duration("0", "abc", "0"), at(9, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAnInteger {
                field: "minutes",
                value: "abc".into()
            }
        );
    }

    #[test]
    fn negative_field_is_rejected() {
        let err = Session::from_mode(&ModeConfig::duration("-1", "0", "0"), at(9, 0, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnInteger { field: "hours", .. }));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = Session::from_mode(&ModeConfig::duration("0", "0", "0"), at(9, 0, 0)).unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveDuration);
    }

    #[test]
    fn until_later_today() {
        let session = Session::until("22:30", at(20, 0, 0)).unwrap();
        assert_eq!(session.planned_end(), at(22, 30, 0));
        assert_eq!(session.mode(), "until 22:30");
    }

    #[test]
    fn until_already_passed_rolls_to_tomorrow() {
        let session = Session::until("22:30", at(23, 0, 0)).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(22, 30, 0)
            .unwrap();
        assert_eq!(session.planned_end(), expected);
    }

    #[test]
    fn until_exactly_now_rolls_to_tomorrow() {
        let start = at(22, 30, 0);
        let session = Session::until("22:30", start).unwrap();
        assert_eq!(session.planned_end(), start + Duration::days(1));
    }

    #[test]
    fn parse_time_of_day_accepts_valid_forms() {
        assert_eq!(parse_time_of_day("7:05").unwrap(), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert_eq!(parse_time_of_day(" 23:59 ").unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert_eq!(parse_time_of_day("00:00").unwrap(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn parse_time_of_day_rejects_malformed_or_out_of_range() {
        for bad in ["", "abc", "24:00", "12:60", "12:5", "123:00", "12-30", "+1:30", "12:30:00"] {
            assert!(parse_time_of_day(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn remaining_secs_goes_negative_after_end() {
        let session = Session::for_duration(0, 1, 0, at(10, 0, 0)).unwrap();
        assert_eq!(session.remaining_secs(at(10, 0, 30)), 30.0);
        assert_eq!(session.remaining_secs(at(10, 1, 10)), -10.0);
    }

    #[test]
    fn format_remaining_switches_on_hours() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(299), "04:59");
        assert_eq!(format_remaining(3600), "01:00:00");
        assert_eq!(format_remaining(3 * 3600 + 61), "03:01:01");
    }

    proptest! {
        #[test]
        fn planned_end_is_start_plus_total(h in 0u64..48, m in 0u64..600, s in 0u64..3600) {
            prop_assume!(h * 3600 + m * 60 + s > 0);
            let start = at(12, 0, 0);
            let session = Session::for_duration(h, m, s, start).unwrap();
            let expected = start + Duration::seconds((h * 3600 + m * 60 + s) as i64);
            prop_assert_eq!(session.planned_end(), expected);
        }

        #[test]
        fn until_is_always_strictly_after_start(hour in 0u32..24, minute in 0u32..60, sh in 0u32..24, sm in 0u32..60) {
            let start = at(sh, sm, 0);
            let session = Session::until(&format!("{hour:02}:{minute:02}"), start).unwrap();
            prop_assert!(session.planned_end() > start);
            prop_assert!(session.planned_end() <= start + Duration::days(1));
        }
    }
}
