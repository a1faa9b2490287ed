use chrono::{DateTime, Duration, TimeZone};
use std::fmt::Display;

/// Placeholder substituted by [`resolve_url_template`].
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Formats a compact `YYMMDD` date key.
///
/// The date is shifted back by `delay_hours` in its own timezone before
/// formatting, so a report day that rolls over at 12Z can be addressed with a
/// delay of 6 from a US local clock. Callers wanting local-time keys should
/// convert with `with_timezone(&Local)` first.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stormwatch::util::format_date_key;
///
/// let date = Utc.with_ymd_and_hms(2024, 6, 7, 18, 0, 0).unwrap();
/// assert_eq!(format_date_key(&date, 0), "240607");
/// ```
pub fn format_date_key<Tz>(date: &DateTime<Tz>, delay_hours: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let shifted = Duration::try_hours(delay_hours)
        .and_then(|delay| date.clone().checked_sub_signed(delay))
        .unwrap_or_else(|| date.clone());
    shifted.format("%y%m%d").to_string()
}

/// Replaces every [`DATE_PLACEHOLDER`] in `template` with the date key for `now`.
///
/// Templates without a placeholder are returned unchanged.
pub fn resolve_url_template<Tz>(template: &str, now: &DateTime<Tz>, delay_hours: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if !template.contains(DATE_PLACEHOLDER) {
        return template.to_string();
    }
    template.replace(DATE_PLACEHOLDER, &format_date_key(now, delay_hours))
}
