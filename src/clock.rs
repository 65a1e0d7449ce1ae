//! Wall-clock helpers
//!
//! The switcher reasons about calendar days (scaling factor, daily counter
//! reset), so every timestamp is taken in one configured zone.

use crate::error::{Result, SwitcherError};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Zone used to derive the calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Host local time
    Local,
    /// Named IANA zone
    Named(Tz),
}

impl Zone {
    /// Parse `local` (case-insensitive, or empty) or an IANA zone name
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        name.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|e| SwitcherError::validation("timezone", e.to_string().as_str()))
    }

    /// Current wall-clock time in this zone
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Zone::Local => Local::now().naive_local(),
            Zone::Named(tz) => Utc::now().with_timezone(tz).naive_local(),
        }
    }
}

/// Day of year, 1 for January 1st
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_and_named() {
        assert_eq!(Zone::parse("local").unwrap(), Zone::Local);
        assert_eq!(Zone::parse("").unwrap(), Zone::Local);
        assert_eq!(
            Zone::parse("Europe/Berlin").unwrap(),
            Zone::Named(chrono_tz::Europe::Berlin)
        );
        assert!(Zone::parse("Nowhere/Special").is_err());
    }

    #[test]
    fn day_of_year_is_one_based() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dec31 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(day_of_year(jan1), 1);
        assert_eq!(day_of_year(dec31), 366);
    }
}
