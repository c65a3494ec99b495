//! "Is this business open right now" evaluation over a weekly schedule.
//!
//! Pure and total: malformed schedules produce `is_open: None`, never a panic.

use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

use crate::models::business::{DayHours, OpeningHours};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Why a business is considered open, closed or unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenStatusReason {
    NoHours,
    ClosedToday,
    IncompleteHours,
    InvalidHours,
    Open,
    Closed,
}

/// Result of an open-status evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OpenStatus {
    pub is_open: Option<bool>,
    pub reason: OpenStatusReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<String>,
    /// Close time when open, otherwise `"<dayname> <opentime>"` of the next opening.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_change: Option<String>,
}

impl OpenStatus {
    fn unknown(reason: OpenStatusReason) -> Self {
        Self {
            is_open: None,
            reason,
            open_time: None,
            close_time: None,
            next_change: None,
        }
    }
}

/// Evaluates the schedule against the host's local wall-clock time.
pub fn evaluate_open_status_now(hours: Option<&OpeningHours>) -> OpenStatus {
    evaluate_open_status(hours, Local::now().naive_local())
}

/// Evaluates the schedule at the given local wall-clock time.
pub fn evaluate_open_status(hours: Option<&OpeningHours>, at: NaiveDateTime) -> OpenStatus {
    let Some(hours) = hours.filter(|h| !h.is_empty()) else {
        return OpenStatus::unknown(OpenStatusReason::NoHours);
    };

    let weekday = at.weekday();
    let next_opening = || find_next_opening(hours, weekday);

    let Some(today) = find_day(hours, weekday) else {
        return OpenStatus {
            is_open: Some(false),
            reason: OpenStatusReason::ClosedToday,
            open_time: None,
            close_time: None,
            next_change: next_opening(),
        };
    };

    let (Some(open_str), Some(close_str)) = (non_blank(&today.open), non_blank(&today.close)) else {
        return OpenStatus::unknown(OpenStatusReason::IncompleteHours);
    };

    let (Some(open), Some(close)) = (parse_minutes(open_str), parse_minutes(close_str)) else {
        return OpenStatus::unknown(OpenStatusReason::InvalidHours);
    };

    let now = at.hour() * 60 + at.minute();
    let is_open = is_within(now, open, close);

    let next_change = if is_open {
        Some(close_str.to_string())
    } else if now < open {
        // Opens later today, overnight schedules included.
        Some(format!("{} {}", spanish_day_name(weekday), open_str))
    } else {
        next_opening()
    };

    OpenStatus {
        is_open: Some(is_open),
        reason: if is_open {
            OpenStatusReason::Open
        } else {
            OpenStatusReason::Closed
        },
        open_time: Some(open_str.to_string()),
        close_time: Some(close_str.to_string()),
        next_change,
    }
}

/// `[open, close)` membership; a close earlier than open crosses midnight,
/// identical bounds mean open around the clock.
fn is_within(now: u32, open: u32, close: u32) -> bool {
    if open == close {
        true
    } else if close < open {
        now >= open || now < close
    } else {
        open <= now && now < close
    }
}

/// Scans the following seven days for the first entry with an opening time.
fn find_next_opening(hours: &OpeningHours, from: Weekday) -> Option<String> {
    let mut day = from;
    for _ in 0..7 {
        day = day.succ();
        if let Some(open) = find_day(hours, day)
            .and_then(|entry| non_blank(&entry.open))
            .filter(|open| parse_minutes(open).is_some())
        {
            return Some(format!("{} {}", spanish_day_name(day), open));
        }
    }
    None
}

/// Resolves the entry for `weekday`, trying Spanish names, English names,
/// abbreviations of either, and finally the numeric index (0 = Sunday).
fn find_day(hours: &OpeningHours, weekday: Weekday) -> Option<&DayHours> {
    day_keys(weekday).iter().find_map(|candidate| {
        hours
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == *candidate)
            .map(|(_, entry)| entry)
    })
}

fn day_keys(weekday: Weekday) -> &'static [&'static str] {
    match weekday {
        Weekday::Sun => &["domingo", "sunday", "dom", "sun", "0"],
        Weekday::Mon => &["lunes", "monday", "lun", "mon", "1"],
        Weekday::Tue => &["martes", "tuesday", "mar", "tue", "tues", "2"],
        Weekday::Wed => &[
            "miércoles", "miercoles", "wednesday", "mié", "mie", "wed", "3",
        ],
        Weekday::Thu => &["jueves", "thursday", "jue", "thu", "thur", "thurs", "4"],
        Weekday::Fri => &["viernes", "friday", "vie", "fri", "5"],
        Weekday::Sat => &["sábado", "sabado", "saturday", "sáb", "sab", "sat", "6"],
    }
}

fn spanish_day_name(weekday: Weekday) -> &'static str {
    day_keys(weekday)[0]
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parses `H:MM`, `HH:MM` or `HH:MM:SS` into minutes since midnight.
fn parse_minutes(value: &str) -> Option<u32> {
    if !shared::validation::is_time_of_day(value) {
        return None;
    }
    let mut parts = value.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let total = hours * 60 + minutes;
    (total < MINUTES_PER_DAY).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// 2026-10-19 is a Monday.
    fn monday_at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn schedule(entries: &[(&str, &str, &str)]) -> OpeningHours {
        entries
            .iter()
            .map(|(day, open, close)| (day.to_string(), DayHours::new(*open, *close)))
            .collect()
    }

    #[test]
    fn test_no_hours() {
        let status = evaluate_open_status(None, monday_at(12, 0));
        assert_eq!(status.is_open, None);
        assert_eq!(status.reason, OpenStatusReason::NoHours);

        let empty = OpeningHours::new();
        let status = evaluate_open_status(Some(&empty), monday_at(12, 0));
        assert_eq!(status.reason, OpenStatusReason::NoHours);
    }

    #[test]
    fn test_open_during_regular_hours() {
        let hours = schedule(&[("lunes", "09:00", "18:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(12, 30));
        assert_eq!(status.is_open, Some(true));
        assert_eq!(status.reason, OpenStatusReason::Open);
        assert_eq!(status.open_time.as_deref(), Some("09:00"));
        assert_eq!(status.close_time.as_deref(), Some("18:00"));
        assert_eq!(status.next_change.as_deref(), Some("18:00"));
    }

    #[test]
    fn test_close_time_is_exclusive() {
        let hours = schedule(&[("lunes", "09:00", "18:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(18, 0));
        assert_eq!(status.is_open, Some(false));
        let status = evaluate_open_status(Some(&hours), monday_at(9, 0));
        assert_eq!(status.is_open, Some(true));
    }

    #[test]
    fn test_midnight_wrap() {
        let hours = schedule(&[("lunes", "22:00", "02:00")]);
        assert_eq!(
            evaluate_open_status(Some(&hours), monday_at(23, 30)).is_open,
            Some(true)
        );
        assert_eq!(
            evaluate_open_status(Some(&hours), monday_at(1, 0)).is_open,
            Some(true)
        );
        assert_eq!(
            evaluate_open_status(Some(&hours), monday_at(10, 0)).is_open,
            Some(false)
        );
    }

    #[test]
    fn test_closed_today_reports_next_opening() {
        let hours = schedule(&[("miercoles", "10:00", "14:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(12, 0));
        assert_eq!(status.is_open, Some(false));
        assert_eq!(status.reason, OpenStatusReason::ClosedToday);
        assert_eq!(status.next_change.as_deref(), Some("miércoles 10:00"));
    }

    #[test]
    fn test_before_opening_reports_today() {
        let hours = schedule(&[("monday", "09:00", "17:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(7, 45));
        assert_eq!(status.is_open, Some(false));
        assert_eq!(status.reason, OpenStatusReason::Closed);
        assert_eq!(status.next_change.as_deref(), Some("lunes 09:00"));
    }

    #[test]
    fn test_overnight_before_opening_reports_tonight() {
        let hours = schedule(&[("lunes", "22:00", "02:00"), ("martes", "22:00", "02:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(10, 0));
        assert_eq!(status.is_open, Some(false));
        assert_eq!(status.reason, OpenStatusReason::Closed);
        assert_eq!(status.next_change.as_deref(), Some("lunes 22:00"));
    }

    #[test]
    fn test_after_closing_scans_forward() {
        let hours = schedule(&[("lun", "09:00", "17:00"), ("vie", "10:00", "15:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(20, 0));
        assert_eq!(status.is_open, Some(false));
        assert_eq!(status.next_change.as_deref(), Some("viernes 10:00"));
    }

    #[test]
    fn test_single_day_schedule_wraps_to_next_week() {
        let hours = schedule(&[("lunes", "09:00", "10:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(11, 0));
        assert_eq!(status.next_change.as_deref(), Some("lunes 09:00"));
    }

    #[test]
    fn test_lookup_precedence_spanish_over_english() {
        let hours = schedule(&[("lunes", "08:00", "12:00"), ("monday", "13:00", "20:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(9, 0));
        assert_eq!(status.open_time.as_deref(), Some("08:00"));
    }

    #[test]
    fn test_lookup_by_numeric_index_and_case() {
        let hours = schedule(&[("1", "08:00", "12:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(9, 0));
        assert_eq!(status.is_open, Some(true));

        let hours = schedule(&[("Lunes", "08:00", "12:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(9, 0));
        assert_eq!(status.is_open, Some(true));
    }

    #[test]
    fn test_incomplete_hours() {
        let mut hours = OpeningHours::new();
        hours.insert(
            "lunes".to_string(),
            DayHours {
                open: Some("09:00".to_string()),
                close: None,
            },
        );
        let status = evaluate_open_status(Some(&hours), monday_at(10, 0));
        assert_eq!(status.is_open, None);
        assert_eq!(status.reason, OpenStatusReason::IncompleteHours);
    }

    #[test]
    fn test_malformed_time_yields_unknown() {
        let hours = schedule(&[("lunes", "nine", "18:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(10, 0));
        assert_eq!(status.is_open, None);
        assert_eq!(status.reason, OpenStatusReason::InvalidHours);
    }

    #[test]
    fn test_identical_bounds_open_all_day() {
        let hours = schedule(&[("lunes", "00:00", "00:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(3, 0));
        assert_eq!(status.is_open, Some(true));
    }

    #[test]
    fn test_serialization_shape() {
        let hours = schedule(&[("lunes", "09:00", "18:00")]);
        let status = evaluate_open_status(Some(&hours), monday_at(12, 0));
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["is_open"], true);
        assert_eq!(json["reason"], "open");
        assert_eq!(json["next_change"], "18:00");
    }
}
