//! Dual-policy expiry computation for E*Trade access tokens.
//!
//! A token is good for two hours of inactivity, but every token also dies at midnight
//! US/Eastern regardless of activity. The session therefore expires at whichever comes
//! first: a rolling deadline shortly before the two-hour mark, or the end of the Eastern
//! calendar day on which the token was started.

// crates.io
use chrono::{DateTime, TimeZone};
use chrono_tz::US::Eastern;
// self
use crate::_prelude::*;

/// Lifetime the provider grants an idle access token.
pub const TOKEN_LIFETIME: Duration = Duration::minutes(120);
/// Safety margin subtracted from [`TOKEN_LIFETIME`].
pub const EXPIRY_MARGIN: Duration = Duration::minutes(2);

/// Computes when a token started at `started_at` should be treated as expired.
///
/// `now` decides whether the day boundary still applies: once `now` is past 23:59:59 US/Eastern
/// of the start day, only the rolling deadline is used.
pub fn compute_expire_time(started_at: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
	let rolling = rolling_deadline(started_at);
	let day_end = end_of_eastern_day(started_at).filter(|end| now <= *end).unwrap_or(rolling);

	rolling.min(day_end)
}

/// `started_at` plus the token lifetime minus the safety margin.
pub fn rolling_deadline(started_at: OffsetDateTime) -> OffsetDateTime {
	started_at + (TOKEN_LIFETIME - EXPIRY_MARGIN)
}

/// 23:59:59 US/Eastern on the Eastern calendar day containing `instant`.
///
/// Returns `None` only when the instant is outside the range chrono can represent.
pub fn end_of_eastern_day(instant: OffsetDateTime) -> Option<OffsetDateTime> {
	let utc = DateTime::from_timestamp(instant.unix_timestamp(), 0)?;
	let local_end = utc.with_timezone(&Eastern).date_naive().and_hms_opt(23, 59, 59)?;
	let end = Eastern.from_local_datetime(&local_end).earliest()?;

	OffsetDateTime::from_unix_timestamp(end.timestamp()).ok()
}

/// Formats a signed duration as a wall clock reading, `HH:MM:SS`.
///
/// The value wraps modulo 24 hours, so one second before zero reads `23:59:59`.
pub fn format_clock(duration: Duration) -> String {
	const DAY: i128 = 86_400;

	let seconds = duration.whole_nanoseconds().div_euclid(1_000_000_000).rem_euclid(DAY);
	let (hours, minutes, seconds) = (seconds / 3_600, seconds % 3_600 / 60, seconds % 60);

	format!("{hours:02}:{minutes:02}:{seconds:02}")
}
