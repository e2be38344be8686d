//! Per-cell medians of binary extent across years.
//!
//! Each year's gridset is reduced to extent by the caller's filters before
//! it reaches [`extent_median_of`]; the builder only gathers the yearly
//! inputs and takes the median.

use super::GridsetBuilder;
use super::composite::stack_gridsets;
use crate::calendar::date_for_day_of_year;
use crate::config::{GridSpec, SearchPaths};
use crate::error::{Result, SeaIceError};
use crate::gridset::{GridData, Gridset, Product};
use crate::models::{Hemisphere, Temporality, ValidRange};
use crate::reduction::{extent_median, mean_or_flag};
use tracing::debug;

/// Extent value written for ice
pub const ICE: f64 = 1.0;

/// Extent value written for open water
pub const OCEAN: f64 = 0.0;

impl GridsetBuilder {
    /// One daily gridset per year for the same day of year.
    ///
    /// Day 366 resolves to January 1st of the following year when the
    /// year is not a leap year.
    pub fn daily_gridsets_for_day_of_year(
        &self,
        hemisphere: Hemisphere,
        start_year: i32,
        end_year: i32,
        day_of_year: u32,
        roots: &SearchPaths,
        interpolation_radius: u32,
    ) -> Result<Vec<Gridset>> {
        (start_year..=end_year)
            .map(|year| {
                let date = date_for_day_of_year(year, day_of_year)?;
                self.concentration_daily(hemisphere, date, roots, interpolation_radius)
            })
            .collect()
    }
}

/// Median of yearly extent gridsets.
///
/// Gridsets that still carry several layers are first reduced to one grid.
/// A cell that is land, coast or missing in every year becomes land.
pub fn extent_median_of(
    spec: &GridSpec,
    hemisphere: Hemisphere,
    temporality: Temporality,
    gridsets: &[Gridset],
) -> Result<Gridset> {
    if gridsets.is_empty() {
        return Err(SeaIceError::NoData);
    }

    let single: Vec<Gridset> = gridsets
        .iter()
        .map(|gridset| {
            if gridset.data.is_stack() {
                let grid = mean_or_flag(
                    gridset.data.as_stack(),
                    gridset.metadata.valid_range,
                    gridset.metadata.missing_value,
                );
                gridset.with_data(GridData::Grid(grid))
            } else {
                gridset.clone()
            }
        })
        .collect();

    debug!("Taking extent median of {} yearly gridsets", single.len());
    let stacked = stack_gridsets(spec, hemisphere, temporality, &single)?;
    let median = extent_median(stacked.data.as_stack(), ICE, OCEAN, &stacked.metadata.flags);

    let mut metadata = stacked.metadata;
    metadata.product = Product::MedianExtent;
    metadata.valid_range = ValidRange::new(OCEAN, ICE);
    Ok(Gridset::new(GridData::Grid(median), metadata))
}
