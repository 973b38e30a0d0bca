//! CF-convention time decoding
//!
//! Model runs regularly span several centuries and use non-standard calendars
//! (`noleap`, `360_day`). Times are decoded into plain [`CfDate`] values using integer
//! day counts, so a run from year 1850 to 3850 decodes as easily as one from 1990 to
//! 2000.

use crate::errors::{FociError, Result};
use crate::grid::Coordinate;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

const CUMULATIVE_DAYS_365: [i64; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];
const CUMULATIVE_DAYS_366: [i64; 13] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366];

/// Supported CF calendars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfCalendar {
    /// `standard`, `gregorian`, `proleptic_gregorian`
    ///
    /// All three are decoded as proleptic Gregorian. CF defines `standard` and `gregorian`
    /// as Julian before 1582-10-15, so dates before the switch can differ by up to ten
    /// days from a mixed-calendar decoder.
    Gregorian,
    /// `noleap`, `365_day`
    NoLeap,
    /// `all_leap`, `366_day`
    AllLeap,
    /// `360_day`
    Day360,
}

impl FromStr for CfCalendar {
    type Err = FociError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Self::Gregorian),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(FociError::TimeDecodeError {
                message: format!("unsupported calendar '{}'", other),
            }),
        }
    }
}

impl CfCalendar {
    /// Day number of a date counted from year 0 of this calendar
    fn days_from_date(self, year: i32, month: u32, day: u32) -> Result<i64> {
        let invalid = || FociError::TimeDecodeError {
            message: format!("{:04}-{:02}-{:02} is not a valid {:?} date", year, month, day, self),
        };
        if !(1..=12).contains(&month) || day == 0 {
            return Err(invalid());
        }
        let (y, m, d) = (i64::from(year), month as usize, i64::from(day));

        match self {
            Self::Gregorian => NaiveDate::from_ymd_opt(year, month, day)
                .map(|date| i64::from(date.num_days_from_ce()))
                .ok_or_else(invalid),
            Self::NoLeap => {
                if d > CUMULATIVE_DAYS_365[m] - CUMULATIVE_DAYS_365[m - 1] {
                    return Err(invalid());
                }
                Ok(y * 365 + CUMULATIVE_DAYS_365[m - 1] + d - 1)
            }
            Self::AllLeap => {
                if d > CUMULATIVE_DAYS_366[m] - CUMULATIVE_DAYS_366[m - 1] {
                    return Err(invalid());
                }
                Ok(y * 366 + CUMULATIVE_DAYS_366[m - 1] + d - 1)
            }
            Self::Day360 => {
                if d > 30 {
                    return Err(invalid());
                }
                Ok(y * 360 + (m as i64 - 1) * 30 + d - 1)
            }
        }
    }

    fn date_from_days(self, days: i64) -> Result<CfDate> {
        let from_table = |year_len: i64, table: &[i64; 13]| {
            let year = days.div_euclid(year_len);
            let doy = days.rem_euclid(year_len);
            let month = (1..=12).find(|&m| doy < table[m]).unwrap_or(12);
            CfDate {
                year: year as i32,
                month: month as u32,
                day: (doy - table[month - 1] + 1) as u32,
            }
        };

        match self {
            Self::Gregorian => {
                let days = i32::try_from(days).map_err(|_| FociError::TimeDecodeError {
                    message: format!("day number {} is out of range", days),
                })?;
                let date = NaiveDate::from_num_days_from_ce_opt(days).ok_or_else(|| {
                    FociError::TimeDecodeError {
                        message: format!("day number {} is out of range", days),
                    }
                })?;
                Ok(CfDate {
                    year: date.year(),
                    month: date.month(),
                    day: date.day(),
                })
            }
            Self::NoLeap => Ok(from_table(365, &CUMULATIVE_DAYS_365)),
            Self::AllLeap => Ok(from_table(366, &CUMULATIVE_DAYS_366)),
            Self::Day360 => {
                let year = days.div_euclid(360);
                let doy = days.rem_euclid(360);
                Ok(CfDate {
                    year: year as i32,
                    month: (doy / 30 + 1) as u32,
                    day: (doy % 30 + 1) as u32,
                })
            }
        }
    }
}

/// A calendar date in some CF calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CfDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for CfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parsed `"<unit> since <reference>"` string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    /// Length of one unit in days
    pub unit_days: f64,
    pub reference: CfDate,
    /// Seconds past midnight of the reference date
    pub reference_seconds: f64,
}

impl FromStr for CfTimeUnits {
    type Err = FociError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = |why: &str| FociError::TimeDecodeError {
            message: format!("cannot parse time units '{}': {}", s, why),
        };

        let (unit, rest) = s.split_once(" since ").ok_or_else(|| bad("missing 'since'"))?;
        let unit_days = timedelta_unit_days(unit).ok_or_else(|| bad("unknown unit"))?;

        let rest = rest.trim().replace('T', " ");
        let mut parts = rest.split_whitespace();
        let date = parts.next().ok_or_else(|| bad("missing reference date"))?;
        let fields: Vec<&str> = date.split('-').collect();
        if fields.len() != 3 {
            return Err(bad("reference date must be Y-M-D"));
        }
        let year = fields[0].parse::<i32>().map_err(|_| bad("invalid year"))?;
        let month = fields[1].parse::<u32>().map_err(|_| bad("invalid month"))?;
        let day = fields[2].parse::<u32>().map_err(|_| bad("invalid day"))?;

        let reference_seconds = match parts.next() {
            Some(clock) => {
                let hms: Vec<f64> = clock
                    .trim_end_matches('Z')
                    .split(':')
                    .map(|p| p.parse::<f64>().map_err(|_| bad("invalid time of day")))
                    .collect::<Result<_>>()?;
                hms.iter()
                    .zip([3600.0, 60.0, 1.0])
                    .map(|(v, scale)| v * scale)
                    .sum()
            }
            None => 0.0,
        };

        Ok(Self {
            unit_days,
            reference: CfDate { year, month, day },
            reference_seconds,
        })
    }
}

/// Length in days of a bare CF time unit (`days`, `hours`, ...)
pub fn timedelta_unit_days(unit: &str) -> Option<f64> {
    match unit.trim().to_ascii_lowercase().as_str() {
        "days" | "day" | "d" => Some(1.0),
        "hours" | "hour" | "hrs" | "hr" | "h" => Some(1.0 / 24.0),
        "minutes" | "minute" | "mins" | "min" => Some(1.0 / 1440.0),
        "seconds" | "second" | "secs" | "sec" | "s" => Some(1.0 / 86400.0),
        _ => None,
    }
}

/// Decoded time axis
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub calendar: CfCalendar,
    pub dates: Vec<CfDate>,
}

impl TimeAxis {
    /// Decode numeric offsets with CF units and calendar
    ///
    /// # Errors
    ///
    /// Returns [`FociError::TimeDecodeError`] for unparseable units, unknown calendars or
    /// non-finite offsets.
    pub fn decode(values: &[f64], units: &str, calendar: &str) -> Result<Self> {
        let units: CfTimeUnits = units.parse()?;
        let calendar: CfCalendar = calendar.parse()?;
        let r = units.reference;
        let origin = calendar.days_from_date(r.year, r.month, r.day)? as f64
            + units.reference_seconds / 86400.0;

        let dates = values
            .iter()
            .map(|&v| {
                if !v.is_finite() {
                    return Err(FociError::TimeDecodeError {
                        message: format!("time value {} is not finite", v),
                    });
                }
                // Small tolerance so that e.g. 29.999999 days still falls on day 30
                let days = (origin + v * units.unit_days + 1e-6).floor() as i64;
                calendar.date_from_days(days)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { calendar, dates })
    }

    /// Decode a time coordinate using its `units` and `calendar` attributes
    ///
    /// A missing calendar attribute means `standard`.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate has no `units` or they cannot be decoded.
    pub fn from_coordinate(coord: &Coordinate) -> Result<Self> {
        let units = coord.units().ok_or_else(|| FociError::TimeDecodeError {
            message: format!("time coordinate on '{}' has no units attribute", coord.dim),
        })?;
        let calendar = coord
            .attrs
            .get("calendar")
            .map_or("standard", String::as_str);
        let values: Vec<f64> = coord.values.iter().copied().collect();
        Self::decode(&values, units, calendar)
    }

    /// Calendar month (1-12) of every time step
    pub fn months(&self) -> Vec<u32> {
        self.dates.iter().map(|d| d.month).collect()
    }

    pub fn years(&self) -> Vec<i32> {
        self.dates.iter().map(|d| d.year).collect()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
