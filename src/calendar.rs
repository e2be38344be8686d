//! Calendar helpers for month boundaries, day-of-year lookups and era checks.

use crate::error::{Result, SeaIceError};
use chrono::{Datelike, Days, NaiveDate};

/// Build a date from a `(year, month, day)` triple
pub fn date_from_triple((year, month, day): (i32, u32, u32)) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| SeaIceError::Configuration {
        message: format!("invalid calendar date {year:04}-{month:02}-{day:02}"),
    })
}

pub fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(SeaIceError::YearMonthOutOfRange { year, month })
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_day_of_month(next_year, next_month)?
        .pred_opt()
        .ok_or(SeaIceError::YearMonthOutOfRange { year, month })
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    Ok(last_day_of_month(year, month)?.day())
}

/// Every date in the month, in order
pub fn dates_in_month(year: i32, month: u32) -> Result<Vec<NaiveDate>> {
    let first = first_day_of_month(year, month)?;
    let last = last_day_of_month(year, month)?;
    Ok(first.iter_days().take_while(|d| *d <= last).collect())
}

/// Inclusive date range; empty when `end` precedes `start`
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn last_day_of_previous_month(today: NaiveDate) -> NaiveDate {
    today
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MIN)
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Date for a day-of-year in `year`; day 366 resolves to January 1 plus
/// 365 days, which lands on January 1 of the following year when `year`
/// is not a leap year.
pub fn date_for_day_of_year(year: i32, day_of_year: u32) -> Result<NaiveDate> {
    let invalid = || SeaIceError::Configuration {
        message: format!("day of year {day_of_year} is outside 1..=366"),
    };
    if day_of_year == 366 {
        let jan_first = NaiveDate::from_yo_opt(year, 1).ok_or_else(invalid)?;
        return jan_first.checked_add_days(Days::new(365)).ok_or_else(invalid);
    }
    NaiveDate::from_yo_opt(year, day_of_year).ok_or_else(invalid)
}

/// Most frequent month among `dates`; ties go to the earliest month
pub fn most_common_month(dates: &[NaiveDate]) -> Option<u32> {
    let mut counts = [0usize; 13];
    for date in dates {
        counts[date.month() as usize] += 1;
    }
    (1..=12u32)
        .filter(|m| counts[*m as usize] > 0)
        .max_by(|a, b| counts[*a as usize].cmp(&counts[*b as usize]).then(b.cmp(a)))
}
