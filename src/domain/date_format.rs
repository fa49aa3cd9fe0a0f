//! Calendar-date (de)serialization in the registration service's fixed format.
//!
//! Use with `#[serde(with = "crate::domain::date_format")]` on `NaiveDate` fields.

use chrono::{Datelike, NaiveDate};
use serde::{de, ser, Deserialize, Deserializer, Serializer};
use std::ops::RangeInclusive;

/// Wire format of every date field: `YYYY-MM-DD`.
///
/// Only years 0000 through 9999 fit in four digits; chrono renders others
/// with a sign (`+10000-01-01`), so they are rejected both ways.
pub const FORMAT: &str = "%Y-%m-%d";

/// Years representable in [`FORMAT`].
pub const YEARS: RangeInclusive<i32> = 0..=9999;

pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if !YEARS.contains(&date.year()) {
        return Err(ser::Error::custom(format_args!(
            "date {} is outside years 0000-9999",
            date
        )));
    }
    serializer.collect_str(&date.format(FORMAT))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date = NaiveDate::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)?;
    if !YEARS.contains(&date.year()) {
        return Err(de::Error::custom(format_args!(
            "date {} is outside years 0000-9999",
            raw
        )));
    }
    Ok(date)
}
