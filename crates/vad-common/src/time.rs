//! Time handling for scan timestamps and output naming.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};

/// Seconds since the Unix epoch (whole seconds, truncated toward the past).
pub fn epoch_seconds(time: &DateTime<Utc>) -> i64 {
    time.timestamp()
}

/// `time` with the sub-second part dropped, matching [`epoch_seconds`].
pub fn whole_seconds(time: &DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}

/// Fractional seconds from `base` to `time`.
pub fn seconds_between(base: &DateTime<Utc>, time: &DateTime<Utc>) -> f64 {
    let delta = *time - *base;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// `base + seconds`, rounded to the microsecond.
pub fn offset_time(base: &DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    *base + Duration::microseconds((seconds * 1e6).round() as i64)
}

/// UTC midnight starting the calendar day of `time`.
pub fn day_start(time: &DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&time.date_naive().and_time(chrono::NaiveTime::MIN))
}

/// Midnight-to-midnight window containing `time`.
pub fn day_window(time: &DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start(time);
    (start, start + Duration::days(1))
}

/// `YYYYMMDD` stamp used in output filenames.
pub fn date_stamp(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d").to_string()
}

/// `{stem}.{YYYYMMDD}.000000.{ext}`
///
/// The name depends only on the stem and the date, so re-running a day
/// overwrites the previous file.
pub fn output_filename(stem: &str, first_scan: &DateTime<Utc>, ext: &str) -> String {
    format!("{}.{}.000000.{}", stem, date_stamp(first_scan), ext)
}

/// CF `units` string for an offset axis anchored at `base`.
pub fn cf_seconds_since(base: &DateTime<Utc>) -> String {
    format!("seconds since {}", base.format("%Y-%m-%d %H:%M:%S 0:00"))
}

/// Human readable form carried by the `base_time` variable.
pub fn base_time_string(base: &DateTime<Utc>) -> String {
    base.format("%d-%b-%Y,%H:%M:%S GMT").to_string()
}

/// Parse a CF `seconds since <reference>` units string.
///
/// Accepts the reference as ISO 8601 (`2017-10-05T00:00:00Z`), with a space
/// separator, with an optional ` 0:00`/`UTC` zone suffix, or as a bare date.
pub fn parse_cf_seconds_since(units: &str) -> Option<DateTime<Utc>> {
    let reference = units.trim().strip_prefix("seconds since")?.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(reference) {
        return Some(dt.with_timezone(&Utc));
    }

    let reference = reference
        .trim_end_matches('Z')
        .trim_end_matches("UTC")
        .trim_end_matches(" 0:00")
        .trim_end_matches("+00:00")
        .trim();

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(reference, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(reference, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN)))
}
