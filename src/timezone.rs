use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// The UTC offset of `canonical_timezone` at the instant `at`.
///
/// Returns `None` if `canonical_timezone` is not a canonical timezone name,
/// e.g. "Asia/Karachi".
pub fn get_local_offset_at(canonical_timezone: &str, at: OffsetDateTime) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&at).to_utc())
}
