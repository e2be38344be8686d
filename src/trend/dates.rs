//! Daily dates behind each year of a trend.
//!
//! Dates run from the first complete month of coverage through the last
//! complete month before today and are grouped by the trend year they
//! contribute to.

use crate::calendar::{date_range, first_day_of_month, last_day_of_month};
use crate::error::{Result, SeaIceError};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Days of `month` in every year from `start` through `year`.
///
/// `start` is the later of the monthly era start and January 1st of the
/// optional start year.
pub fn monthly_trend_dates(
    era_start_monthly: NaiveDate,
    last_complete_day: NaiveDate,
    year: i32,
    month: u32,
    start_year: Option<i32>,
) -> Vec<NaiveDate> {
    let start = start_year
        .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        .map_or(era_start_monthly, |first| first.max(era_start_monthly));

    date_range(start, last_complete_day)
        .into_iter()
        .filter(|date| date.month() == month && date.year() <= year)
        .collect()
}

/// Trend year a season day belongs to; months after the season's last
/// month count toward the following year
pub fn season_year(date: NaiveDate, months: &[u32; 3]) -> i32 {
    if date.month() > months[2] {
        date.year() + 1
    } else {
        date.year()
    }
}

/// Days of the season's months, trimmed to complete seasons ending no
/// later than `year`
pub fn seasonal_trend_dates(
    era_start_monthly: NaiveDate,
    last_complete_day: NaiveDate,
    year: i32,
    months: &[u32; 3],
) -> Result<Vec<NaiveDate>> {
    let dates: Vec<NaiveDate> = date_range(era_start_monthly, last_complete_day)
        .into_iter()
        .filter(|date| date.year() <= year)
        .collect();

    let mut season_starts = Vec::new();
    let mut season_ends = Vec::new();
    for date in &dates {
        if *date == first_day_of_month(date.year(), months[0])? {
            season_starts.push(*date);
        }
        if *date == last_day_of_month(date.year(), months[2])? {
            season_ends.push(*date);
        }
    }
    let (Some(first), Some(last)) = (season_starts.first(), season_ends.last()) else {
        return Ok(Vec::new());
    };

    Ok(dates
        .into_iter()
        .filter(|date| first <= date && date <= last && months.contains(&date.month()))
        .collect())
}

/// Dates grouped by calendar year
pub fn group_by_year(dates: &[NaiveDate]) -> BTreeMap<i32, Vec<NaiveDate>> {
    group_by(dates, |date| date.year())
}

/// Dates grouped by the season year they contribute to
pub fn group_by_season_year(dates: &[NaiveDate], months: &[u32; 3]) -> BTreeMap<i32, Vec<NaiveDate>> {
    group_by(dates, |date| season_year(date, months))
}

fn group_by(dates: &[NaiveDate], key: impl Fn(NaiveDate) -> i32) -> BTreeMap<i32, Vec<NaiveDate>> {
    let mut groups: BTreeMap<i32, Vec<NaiveDate>> = BTreeMap::new();
    for date in dates {
        groups.entry(key(*date)).or_default().push(*date);
    }
    groups
}

/// First and last trend year covered by `dates`
pub fn year_span(dates: &[NaiveDate], key: impl Fn(NaiveDate) -> i32) -> Result<(i32, i32)> {
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => Ok((key(*first), key(*last))),
        _ => Err(SeaIceError::NoData),
    }
}
