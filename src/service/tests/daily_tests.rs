//! Daily, date-range and day-of-year requests

use super::service_for;
use crate::error::SeaIceError;
use crate::external::{BadDateList, InMemoryInvalidIceMasks};
use crate::fixtures::{Archive, LAND, MISSING, POLE, codes, uniform, ymd};
use crate::gridset::Product;
use crate::models::{Hemisphere, ValidRange};
use crate::service::{AverageOptions, DailyMedianOptions, DailyOptions};
use ndarray::array;

#[test]
fn test_daily_concentration_drops_invalid_ice_when_asked() {
    let archive = Archive::new();
    archive.daily(Hemisphere::North, ymd(2010, 1, 5), "f17", "v1.1", &uniform(100));
    let masks = InMemoryInvalidIceMasks::new().with_mask(
        Hemisphere::North,
        1,
        array![[true, false, false], [false, false, false]],
    );
    let service = service_for(&archive).with_invalid_ice_masks(masks);

    let kept = service
        .concentration_daily(Hemisphere::North, ymd(2010, 1, 5), &DailyOptions::default())
        .unwrap();
    assert!(kept.data.all_equal(40.0));

    let masked = service
        .concentration_daily(
            Hemisphere::North,
            ymd(2010, 1, 5),
            &DailyOptions::default().with_drop_invalid_ice(true),
        )
        .unwrap();
    let grid = masked.data.layer(0).unwrap();
    assert_eq!(grid[[0, 0]], 0.0);
    assert_eq!(grid[[0, 1]], 40.0);
    assert!(masked.metadata.drop_invalid_ice);
}

#[test]
fn test_bad_date_gives_empty_or_no_data() {
    let archive = Archive::new();
    archive.daily(Hemisphere::North, ymd(2010, 1, 5), "f17", "v1.1", &uniform(100));
    let bad = BadDateList::new().with_date(Hemisphere::North, ymd(2010, 1, 5));
    let service = service_for(&archive).with_bad_dates(bad);

    let allowed = service
        .concentration_daily(Hemisphere::North, ymd(2010, 1, 5), &DailyOptions::default())
        .unwrap();
    assert!(!allowed.metadata.empty_gridset);

    let options = DailyOptions::default().with_allow_bad_dates(false);
    let dropped = service
        .concentration_daily(Hemisphere::North, ymd(2010, 1, 5), &options)
        .unwrap();
    assert!(dropped.metadata.empty_gridset);
    assert!(dropped.is_uniformly_missing());

    let err = service
        .concentration_daily(
            Hemisphere::North,
            ymd(2010, 1, 5),
            &options.with_allow_empty_gridset(false),
        )
        .unwrap_err();
    assert!(matches!(err, SeaIceError::NoData));
}

#[test]
fn test_missing_day_is_empty_unless_forbidden() {
    let archive = Archive::new();
    let service = service_for(&archive);

    let gridset = service
        .concentration_daily(Hemisphere::South, ymd(2012, 7, 1), &DailyOptions::default())
        .unwrap();
    assert!(gridset.metadata.empty_gridset);

    let err = service
        .concentration_daily(
            Hemisphere::South,
            ymd(2012, 7, 1),
            &DailyOptions::default().with_allow_empty_gridset(false),
        )
        .unwrap_err();
    assert!(err.is_no_data());
}

#[test]
fn test_daily_extent_thresholds_and_keeps_flags() {
    let archive = Archive::new();
    archive.daily(
        Hemisphere::North,
        ymd(2011, 3, 3),
        "f17",
        "v1.1",
        &codes([100, 25, LAND, POLE, MISSING, 38]),
    );
    let service = service_for(&archive);

    let extent = service
        .extent_daily(Hemisphere::North, ymd(2011, 3, 3), &DailyOptions::for_extent(), None)
        .unwrap();
    let grid = extent.data.layer(0).unwrap();
    assert_eq!(grid[[0, 0]], 1.0);
    assert_eq!(grid[[0, 1]], 0.0);
    assert_eq!(grid[[0, 2]], 254.0);
    assert_eq!(grid[[1, 0]], 1.0);
    assert_eq!(grid[[1, 1]], 255.0);
    assert_eq!(grid[[1, 2]], 1.0);
    assert_eq!(extent.metadata.product, Product::Extent);
    assert_eq!(extent.metadata.valid_range, ValidRange::new(0.0, 1.0));

    let strict = service
        .extent_daily(
            Hemisphere::North,
            ymd(2011, 3, 3),
            &DailyOptions::for_extent(),
            Some(50.0),
        )
        .unwrap();
    assert_eq!(strict.data.layer(0).unwrap()[[0, 0]], 0.0);
}

#[test]
fn test_extent_defaults_drop_invalid_ice() {
    assert!(DailyOptions::for_extent().drop_invalid_ice);
    assert!(!DailyOptions::default().drop_invalid_ice);
    assert!(AverageOptions::default().drop_invalid_ice);
    assert_eq!(DailyMedianOptions::default().interpolation_radius, 1);
}

#[test]
fn test_daily_interpolation_fills_from_neighbors() {
    let archive = Archive::new();
    archive.daily(Hemisphere::North, ymd(2010, 4, 1), "f17", "v1.1", &uniform(50));
    archive.daily(
        Hemisphere::North,
        ymd(2010, 4, 2),
        "f17",
        "v1.1",
        &codes([100, MISSING, 100, 100, 100, 100]),
    );
    archive.daily(Hemisphere::North, ymd(2010, 4, 3), "f17", "v1.1", &uniform(100));
    let service = service_for(&archive);

    let gridset = service
        .concentration_daily(
            Hemisphere::North,
            ymd(2010, 4, 2),
            &DailyOptions::default().with_interpolation_radius(1),
        )
        .unwrap();

    let grid = gridset.data.layer(0).unwrap();
    assert_eq!(gridset.data.depth(), 1);
    assert_eq!(grid[[0, 0]], 40.0);
    assert_eq!(grid[[0, 1]], 30.0);
}

#[test]
fn test_average_over_date_range_masks_by_dominant_month() {
    let archive = Archive::new();
    archive.daily(Hemisphere::North, ymd(2010, 3, 1), "f17", "v1.1", &uniform(50));
    archive.daily(Hemisphere::North, ymd(2010, 3, 2), "f17", "v1.1", &uniform(100));
    let masks = InMemoryInvalidIceMasks::new().with_mask(
        Hemisphere::North,
        3,
        array![[false, false, false], [false, false, true]],
    );
    let service = service_for(&archive).with_invalid_ice_masks(masks);

    let average = service
        .concentration_daily_average_over_date_range(
            Hemisphere::North,
            ymd(2010, 2, 28),
            ymd(2010, 3, 2),
            &AverageOptions::default(),
        )
        .unwrap();

    let grid = average.data.layer(0).unwrap();
    assert_eq!(grid[[0, 0]], 30.0);
    assert_eq!(grid[[1, 2]], 0.0);
    assert_eq!(average.metadata.files.len(), 2);
}

#[test]
fn test_average_rejects_dates_outside_coverage() {
    let archive = Archive::new();
    let service = service_for(&archive);

    let err = service
        .concentration_daily_average_over_date_range(
            Hemisphere::North,
            ymd(1978, 10, 1),
            ymd(1978, 11, 5),
            &AverageOptions::default(),
        )
        .unwrap_err();
    assert!(err.is_out_of_range());
}

#[test]
fn test_daily_median_over_years() {
    let archive = Archive::new();
    let with_land = |code| codes([code, code, code, code, code, LAND]);
    archive.daily(Hemisphere::North, ymd(2010, 2, 1), "f17", "v1.1", &with_land(100));
    archive.daily(Hemisphere::North, ymd(2011, 2, 1), "f17", "v1.1", &with_land(100));
    archive.daily(Hemisphere::North, ymd(2012, 2, 1), "f17", "v1.1", &with_land(0));
    let service = service_for(&archive);

    let median = service
        .extent_daily_median(Hemisphere::North, 2010, 2012, 32, &DailyMedianOptions::default())
        .unwrap();

    let grid = median.data.layer(0).unwrap();
    assert_eq!(grid[[0, 0]], 1.0);
    assert_eq!(grid[[1, 1]], 1.0);
    assert_eq!(grid[[1, 2]], 254.0);
    assert_eq!(median.metadata.product, Product::MedianExtent);
    assert_eq!(median.metadata.day_of_year, Some(32));
    assert_eq!(median.metadata.years, vec![2010, 2011, 2012]);
}

#[test]
fn test_listing_cache_is_reused_until_invalidated() {
    let archive = Archive::new();
    let service = service_for(&archive);
    let date = ymd(2010, 6, 1);

    let before = service
        .concentration_daily(Hemisphere::North, date, &DailyOptions::default())
        .unwrap();
    assert!(before.metadata.empty_gridset);

    archive.daily(Hemisphere::North, date, "f17", "v1.1", &uniform(100));
    let stale = service
        .concentration_daily(Hemisphere::North, date, &DailyOptions::default())
        .unwrap();
    assert!(stale.metadata.empty_gridset);
    assert!(service.cache_stats().hits >= 1);

    service.invalidate_cache();
    let fresh = service
        .concentration_daily(Hemisphere::North, date, &DailyOptions::default())
        .unwrap();
    assert!(fresh.data.all_equal(40.0));
}
