//! Resolves the dashboard's named date filters (e.g. "Last 7 Days") into
//! concrete, timezone-aware intervals.
//!
//! All presets use inclusive day boundaries in the configured local timezone:
//! a range starts at 00:00:00.000 on its first day and ends at 23:59:59.999 on
//! its last day.

use std::{fmt, str::FromStr, sync::Arc};

use serde::Serialize;
use time::{
    Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::BorrowedFormatItem,
    macros::{date, format_description, time},
};

use crate::{Error, clock::Clock, timezone::get_local_offset_at};

/// Wire format for interval bounds, e.g. "2025-06-01T00:00:00+05:00".
///
/// Sub-second precision is dropped and the offset is always numeric, never `Z`.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// Format of the calendar dates accepted for custom ranges, e.g. "2025-06-01".
const CALENDAR_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

const END_OF_DAY: Time = time!(23:59:59.999);

/// The first day covered by [DatePreset::AllTime].
pub const ALL_TIME_FLOOR: Date = date!(2000 - 01 - 01);

/// The date filters offered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    /// The local day so far.
    Today,
    /// The local day before today.
    Yesterday,
    /// Today and the six days before it.
    Last7Days,
    /// Today and the 29 days before it.
    Last30Days,
    /// The whole of the current calendar month.
    ThisMonth,
    /// The whole of the previous calendar month.
    LastMonth,
    /// From [ALL_TIME_FLOOR] through today.
    AllTime,
    /// Chosen when the user supplies their own start and end dates, see
    /// [DateRangeResolver::resolve_custom].
    CustomDate,
}

impl DatePreset {
    /// Every preset, in the order they are offered to the user.
    pub const ALL: [DatePreset; 8] = [
        Self::Today,
        Self::Yesterday,
        Self::Last7Days,
        Self::Last30Days,
        Self::ThisMonth,
        Self::LastMonth,
        Self::AllTime,
        Self::CustomDate,
    ];

    /// The display name, which is also the name clients send.
    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
            Self::ThisMonth => "This Month",
            Self::LastMonth => "Last Month",
            Self::AllTime => "All Time",
            Self::CustomDate => "Custom Date",
        }
    }
}

impl FromStr for DatePreset {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.label() == name)
            .ok_or_else(|| Error::UnknownDatePreset(name.to_owned()))
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do when a client asks for a preset that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPresetPolicy {
    /// Fall back to the unbounded interval, i.e. no date filtering at all.
    #[default]
    Unbounded,
    /// Fail with [Error::UnknownDatePreset].
    Reject,
}

/// A time interval used to filter dashboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInterval {
    /// No date filtering. Serialized as empty start and end strings.
    Unbounded,
    /// An inclusive interval where `start <= end`.
    Bounded {
        /// The first instant.
        start: OffsetDateTime,
        /// The last instant.
        end: OffsetDateTime,
    },
}

impl DateInterval {
    /// The first instant of the interval, if bounded.
    pub fn start(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Unbounded => None,
            Self::Bounded { start, .. } => Some(*start),
        }
    }

    /// The last instant of the interval, if bounded.
    pub fn end(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Unbounded => None,
            Self::Bounded { end, .. } => Some(*end),
        }
    }

    /// The string form sent to clients and the payments backend.
    ///
    /// # Errors
    ///
    /// Returns [Error::TimestampFormat] if a bound cannot be formatted.
    pub fn to_wire(&self) -> Result<WireInterval, Error> {
        match self {
            Self::Unbounded => Ok(WireInterval::default()),
            Self::Bounded { start, end } => Ok(WireInterval {
                start: format_timestamp(*start)?,
                end: format_timestamp(*end)?,
            }),
        }
    }

    /// The `start` and `end` query parameters for a listing query.
    ///
    /// An unbounded interval omits both parameters.
    ///
    /// # Errors
    ///
    /// Returns [Error::TimestampFormat] if a bound cannot be formatted.
    pub fn query_params(&self) -> Result<Vec<(&'static str, String)>, Error> {
        match self {
            Self::Unbounded => Ok(Vec::new()),
            Self::Bounded { .. } => {
                let WireInterval { start, end } = self.to_wire()?;
                Ok(vec![("start", start), ("end", end)])
            }
        }
    }
}

/// A [DateInterval] as a pair of ISO-8601 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireInterval {
    /// The first instant, or empty if unbounded.
    pub start: String,
    /// The last instant, or empty if unbounded.
    pub end: String,
}

/// Format `date_time` as ISO-8601 with a numeric offset, e.g.
/// "2025-06-01T23:59:59+05:00".
///
/// # Errors
///
/// Returns [Error::TimestampFormat] if the date time cannot be formatted.
pub fn format_timestamp(date_time: OffsetDateTime) -> Result<String, Error> {
    date_time
        .format(TIMESTAMP_FORMAT)
        .map_err(|error| Error::TimestampFormat(error.to_string()))
}

/// Parse a calendar date in the form "YYYY-MM-DD".
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `text` is not a valid calendar date.
pub fn parse_calendar_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), CALENDAR_DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// The local first and last instants covered by `preset` when the local date
/// is `today`.
///
/// Returns `None` for [DatePreset::CustomDate], which depends on user input.
pub fn preset_bounds(
    preset: DatePreset,
    today: Date,
) -> Option<(PrimitiveDateTime, PrimitiveDateTime)> {
    let (first_day, last_day) = match preset {
        DatePreset::Today => (today, today),
        DatePreset::Yesterday => {
            let yesterday = today - Duration::days(1);
            (yesterday, yesterday)
        }
        DatePreset::Last7Days => (today - Duration::days(6), today),
        DatePreset::Last30Days => (today - Duration::days(29), today),
        DatePreset::ThisMonth => month_bounds(today),
        DatePreset::LastMonth => month_bounds(first_day_of_month(today) - Duration::days(1)),
        DatePreset::AllTime => (ALL_TIME_FLOOR, today),
        DatePreset::CustomDate => return None,
    };

    Some((first_day.midnight(), last_day.with_time(END_OF_DAY)))
}

/// Turns date presets and custom date pairs into [DateInterval]s relative to
/// the current local date.
pub struct DateRangeResolver {
    clock: Arc<dyn Clock>,
    local_timezone: String,
    unknown_preset_policy: UnknownPresetPolicy,
}

impl DateRangeResolver {
    /// Create a resolver for the canonical timezone `local_timezone`, e.g.
    /// "Asia/Karachi".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezone] if `local_timezone` is not a canonical
    /// timezone name.
    pub fn new(
        clock: Arc<dyn Clock>,
        local_timezone: &str,
        unknown_preset_policy: UnknownPresetPolicy,
    ) -> Result<Self, Error> {
        if get_local_offset_at(local_timezone, clock.now_utc()).is_none() {
            return Err(Error::InvalidTimezone(local_timezone.to_owned()));
        }

        Ok(Self {
            clock,
            local_timezone: local_timezone.to_owned(),
            unknown_preset_policy,
        })
    }

    /// The current date in the local timezone.
    pub fn today(&self) -> Date {
        let now = self.clock.now_utc();
        now.to_offset(self.offset_at(now)).date()
    }

    /// Resolve the preset called `preset_name` against today's date.
    ///
    /// Names that are not a resolvable preset, including "Custom Date", are
    /// handled by the configured [UnknownPresetPolicy].
    ///
    /// # Errors
    ///
    /// Returns [Error::UnknownDatePreset] only under [UnknownPresetPolicy::Reject].
    pub fn resolve(&self, preset_name: &str) -> Result<DateInterval, Error> {
        let bounds = preset_name
            .parse::<DatePreset>()
            .ok()
            .and_then(|preset| preset_bounds(preset, self.today()));

        match bounds {
            Some((start, end)) => Ok(self.localize(start, end)),
            None => match self.unknown_preset_policy {
                UnknownPresetPolicy::Unbounded => {
                    tracing::debug!("No date preset named \"{preset_name}\", using no date filter.");
                    Ok(DateInterval::Unbounded)
                }
                UnknownPresetPolicy::Reject => {
                    Err(Error::UnknownDatePreset(preset_name.to_owned()))
                }
            },
        }
    }

    /// Build an interval from a user-supplied date pair, from the start of
    /// `start_date` to the end of `end_date`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvertedDateRange] if `start_date` is after `end_date`.
    pub fn resolve_custom(&self, start_date: Date, end_date: Date) -> Result<DateInterval, Error> {
        if start_date > end_date {
            return Err(Error::InvertedDateRange {
                start: start_date,
                end: end_date,
            });
        }

        Ok(self.localize(start_date.midnight(), end_date.with_time(END_OF_DAY)))
    }

    /// Like [DateRangeResolver::resolve_custom], but for "YYYY-MM-DD" strings.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDate] if either string is not a calendar date, or
    /// [Error::InvertedDateRange] if the start is after the end.
    pub fn resolve_custom_str(&self, start_date: &str, end_date: &str) -> Result<DateInterval, Error> {
        let start_date = parse_calendar_date(start_date)?;
        let end_date = parse_calendar_date(end_date)?;

        self.resolve_custom(start_date, end_date)
    }

    fn localize(&self, start: PrimitiveDateTime, end: PrimitiveDateTime) -> DateInterval {
        DateInterval::Bounded {
            start: self.assume_local(start),
            end: self.assume_local(end),
        }
    }

    /// Attach the offset the local timezone has at `local`.
    ///
    /// The offset is looked up as if `local` were UTC, which only differs
    /// from the true offset within a few hours of a daylight saving change.
    fn assume_local(&self, local: PrimitiveDateTime) -> OffsetDateTime {
        local.assume_offset(self.offset_at(local.assume_utc()))
    }

    fn offset_at(&self, at: OffsetDateTime) -> UtcOffset {
        get_local_offset_at(&self.local_timezone, at).unwrap_or(UtcOffset::UTC)
    }
}

fn first_day_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

fn month_bounds(date: Date) -> (Date, Date) {
    let first_day = first_day_of_month(date);
    let last_day =
        first_day + Duration::days(i64::from(days_in_month(date.year(), date.month())) - 1);

    (first_day, last_day)
}

fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if time::util::is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}
