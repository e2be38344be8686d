//! Calendar validation of requests

use crate::error::SeaIceError;
use crate::fixtures::{Archive, TODAY, builder_for, ymd};
use crate::models::Hemisphere;

#[test]
fn test_dates_outside_the_era_are_rejected() {
    let archive = Archive::new();
    let builder = builder_for(&archive);
    let (year, month, day) = TODAY;

    for date in [ymd(1978, 10, 25), ymd(year, month, day), ymd(2030, 1, 1)] {
        let err = builder
            .concentration_daily(Hemisphere::North, date, &archive.search_paths(), 0)
            .unwrap_err();
        assert!(
            matches!(err, SeaIceError::DateOutOfRange { date: d } if d == date),
            "{date}: {err}"
        );
    }
}

#[test]
fn test_era_boundaries_are_accepted() {
    let archive = Archive::new();
    let builder = builder_for(&archive);

    assert!(builder.validate_date(ymd(1978, 10, 26)).is_ok());
    assert!(builder.validate_date(ymd(2021, 6, 14)).is_ok());
}

#[test]
fn test_year_month_must_be_complete_and_within_era() {
    let archive = Archive::new();
    let builder = builder_for(&archive);

    assert!(builder.validate_year_month(1978, 10).is_ok());
    assert!(builder.validate_year_month(2021, 5).is_ok());

    for (year, month) in [(1978, 9), (2021, 6), (2022, 1)] {
        let err = builder.validate_year_month(year, month).unwrap_err();
        assert!(err.is_out_of_range(), "{year}-{month}: {err}");
    }
}

#[test]
fn test_monthly_request_out_of_range_is_not_clamped() {
    let archive = Archive::new();
    let builder = builder_for(&archive);
    let err = builder
        .concentration_monthly(Hemisphere::South, 2021, 6, &archive.search_paths(), 2)
        .unwrap_err();
    assert!(matches!(
        err,
        SeaIceError::YearMonthOutOfRange {
            year: 2021,
            month: 6
        }
    ));
}

#[test]
fn test_last_complete_day_is_end_of_previous_month() {
    let archive = Archive::new();
    let builder = builder_for(&archive);
    assert_eq!(builder.last_complete_day(), ymd(2021, 5, 31));
}
