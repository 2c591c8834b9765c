//! Time conversions used by the query client and the flat-file tables.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::errors::StationRefErr;

/// Format of the `lddate` and `systemChangeTime` columns, always 17 characters wide.
pub const LOAD_DATE_FORMAT: &str = "%y-%m-%d %H:%M:%S";

/// An optional start and end time used to limit queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeWindow {
    /// Earliest time of interest.
    pub start: Option<DateTime<Utc>>,
    /// Latest time of interest.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// A window with no limits.
    pub fn unbounded() -> Self {
        TimeWindow::default()
    }

    /// Create a window and check that it makes sense relative to `now`.
    ///
    /// The start must not be after the end, and the start must not be in the future.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, StationRefErr> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(StationRefErr::InvalidTime(format!(
                    "start time {} is after end time {}",
                    iso8601(start),
                    iso8601(end)
                )));
            }
        }

        if let Some(start) = start {
            if start > now {
                return Err(StationRefErr::InvalidTime(format!(
                    "start time {} is in the future",
                    iso8601(start)
                )));
            }
        }

        Ok(TimeWindow { start, end })
    }

    /// Build a window from command line strings, each either epoch seconds or ISO 8601.
    pub fn from_args(start: Option<&str>, end: Option<&str>) -> Result<Self, StationRefErr> {
        let start = start.map(parse_time_arg).transpose()?;
        let end = end.map(parse_time_arg).transpose()?;

        TimeWindow::new(start, end, Utc::now())
    }

    /// The `start-time` and `end-time` query parameters, only for the limits that are set.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(2);
        if let Some(start) = self.start {
            params.push(("start-time", iso8601(start)));
        }
        if let Some(end) = self.end {
            params.push(("end-time", iso8601(end)));
        }
        params
    }
}

/// Parse a command line time, given as integer epoch seconds or as ISO 8601.
///
/// ISO 8601 values may be a bare date (`1987-09-22`) or a date and time
/// (`1987-09-22T12:08:44`). Fractional seconds are not accepted.
pub fn parse_time_arg(arg: &str) -> Result<DateTime<Utc>, StationRefErr> {
    let arg = arg.trim();

    if let Ok(secs) = arg.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| StationRefErr::InvalidTime(format!("epoch out of range: {}", arg)));
    }

    let invalid = || {
        StationRefErr::InvalidTime(format!(
            "'{}' is neither epoch seconds nor ISO 8601 (yyyy-mm-dd[Thh:mm:ss])",
            arg
        ))
    };

    if arg.len() < 10 || !arg.is_char_boundary(10) {
        return Err(invalid());
    }

    let date = NaiveDate::parse_from_str(&arg[..10], "%Y-%m-%d").map_err(|_| invalid())?;
    let trimmed = arg.trim_end_matches('Z');
    let naive = if trimmed.len() >= 19 {
        NaiveDateTime::parse_from_str(&trimmed[..19], "%Y-%m-%dT%H:%M:%S").map_err(|_| invalid())?
    } else {
        date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?
    };

    Ok(Utc.from_utc_datetime(&naive))
}

/// Parse an instant as it appears in service responses.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, StationRefErr> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|err| StationRefErr::InvalidTime(format!("'{}': {}", value, err)))
}

/// Render an instant as `yyyy-mm-ddThh:mm:ssZ`.
pub fn iso8601(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Julian date, `<4-digit year><3-digit zero padded day of year>`.
pub fn jdate(time: DateTime<Utc>) -> String {
    format!("{:04}{:03}", time.year(), time.ordinal())
}

/// Seconds since the epoch including the fractional part.
pub fn epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1.0e9
}

/// Epoch seconds with a fixed number of decimals, as used by `time` and `endtime` columns.
pub fn epoch_string(time: DateTime<Utc>, decimals: usize) -> String {
    format!("{:.*}", decimals, epoch_seconds(time))
}

/// Render a load date for the `lddate` column.
pub fn load_date(time: NaiveDateTime) -> String {
    time.format(LOAD_DATE_FORMAT).to_string()
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
