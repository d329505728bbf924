//! Date parsing and query windows for event commands.
//!
//! User-facing dates are either `MM-DD-YYYY HH:MM` in local time or RFC 3339.
//! [`EventWindow`] turns optional `--from`/`--to`/`--max-results` arguments
//! into a concrete query.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on events fetched in one listing.
pub const MAX_EVENT_RESULTS: u32 = 20;

const USER_FORMAT: &str = "%m-%d-%Y %H:%M";

/// Errors from parsing user-supplied dates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid date '{0}': expected MM-DD-YYYY HH:MM or RFC 3339")]
    Unparseable(String),

    #[error("date '{0}' does not exist in the local timezone")]
    Nonexistent(String),

    #[error("start {from} is after end {to}")]
    Reversed { from: String, to: String },
}

/// Parses a user date in the local timezone.
pub fn parse_user_datetime(input: &str) -> Result<DateTime<Utc>, TimeError> {
    parse_datetime_in(input, &Local)
}

/// Parses a user date, interpreting `MM-DD-YYYY HH:MM` in `tz`.
pub fn parse_datetime_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>, TimeError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(input, USER_FORMAT)
        .map_err(|_| TimeError::Unparseable(input.to_string()))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeError::Nonexistent(input.to_string()))
}

/// Start or end of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// An all-day date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Returns `true` if this is an all-day date.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Renders in local time, or as a plain date for all-day values.
    pub fn to_local_string(&self) -> String {
        match self {
            Self::DateTime(dt) => dt.with_timezone(&Local).format("%m/%d/%Y, %H:%M").to_string(),
            Self::AllDay(date) => date.format("%m/%d/%Y").to_string(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_local_string())
    }
}

/// Resolved query range and result limit for an event listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub max_results: u32,
    /// Set when the requested limit exceeded [`MAX_EVENT_RESULTS`].
    pub clamped: bool,
}

impl EventWindow {
    /// Resolves arguments against the local clock.
    ///
    /// Defaults are now until the end of today, capped at
    /// [`MAX_EVENT_RESULTS`] events.
    pub fn resolve(
        from: Option<&str>,
        to: Option<&str>,
        max_results: Option<u32>,
    ) -> Result<Self, TimeError> {
        Self::resolve_at(from, to, max_results, Local::now())
    }

    /// Like [`EventWindow::resolve`] with an explicit `now`.
    pub fn resolve_at<Tz: TimeZone>(
        from: Option<&str>,
        to: Option<&str>,
        max_results: Option<u32>,
        now: DateTime<Tz>,
    ) -> Result<Self, TimeError> {
        let tz = now.timezone();
        let start = match from {
            Some(s) => parse_datetime_in(s, &tz)?,
            None => now.with_timezone(&Utc),
        };
        let end = match to {
            Some(s) => parse_datetime_in(s, &tz)?,
            None => end_of_day(&now),
        };
        if start > end {
            return Err(TimeError::Reversed {
                from: start.to_rfc3339(),
                to: end.to_rfc3339(),
            });
        }

        let (max_results, clamped) = match max_results {
            None | Some(0) => (MAX_EVENT_RESULTS, false),
            Some(n) if n > MAX_EVENT_RESULTS => (MAX_EVENT_RESULTS, true),
            Some(n) => (n, false),
        };

        Ok(Self {
            from: start,
            to: end,
            max_results,
            clamped,
        })
    }

    /// Lower bound in the form the calendar API expects.
    pub fn time_min(&self) -> String {
        self.from.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    /// Upper bound in the form the calendar API expects.
    pub fn time_max(&self) -> String {
        self.to.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// Midnight at the start of the day after `now`, in `now`'s timezone.
fn end_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    now.date_naive()
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc) + chrono::Duration::days(1))
}
