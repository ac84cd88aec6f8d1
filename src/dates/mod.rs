//! Meeting date normalization.
//!
//! All meeting times are civil times in Pacific/Auckland resolved to UTC
//! through the timezone database, so daylight-saving transitions land on the
//! correct offset instead of a static hour table.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::errors::AppError;

/// The fixed civil timezone used to interpret and emit all meeting times.
pub const MEETING_TZ: Tz = chrono_tz::Pacific::Auckland;

const MEETING_HOUR: u32 = 19;
const MEETING_MINUTE: u32 = 30;

/// Resolve a naive local datetime in the meeting timezone to UTC.
/// Ambiguous times (clocks rolled back) take the earlier offset.
fn local_to_utc(local: NaiveDateTime) -> Result<DateTime<Utc>, AppError> {
    MEETING_TZ
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::Validation(format!("{} does not exist in {}", local, MEETING_TZ))
        })
}

/// The third Tuesday of the given month at 19:30 Pacific/Auckland, as UTC.
pub fn third_tuesday(year: i32, month: u32) -> Result<DateTime<Utc>, AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("Invalid month/year: {}/{}", month, year)))?;

    let days_to_tuesday = (Weekday::Tue.num_days_from_sunday() + 7
        - first.weekday().num_days_from_sunday())
        % 7;
    let day = first + Days::new(u64::from(days_to_tuesday) + 14);

    let local = day
        .and_hms_opt(MEETING_HOUR, MEETING_MINUTE, 0)
        .ok_or_else(|| AppError::Internal("Invalid meeting time constants".to_string()))?;
    local_to_utc(local)
}

/// Convert an explicit "YYYY-MM-DDTHH:MM" value (Pacific/Auckland local time)
/// to UTC.
pub fn custom_date_to_utc(value: &str) -> Result<DateTime<Utc>, AppError> {
    let local = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid meeting datetime: {}", value)))?;
    local_to_utc(local)
}
