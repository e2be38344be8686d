//! Gridset construction from located source files.
//!
//! The builder validates the requested calendar period, asks the locator
//! for the authoritative files, reads and scales them, and reduces stacks
//! into daily, monthly, seasonal and multi-year composites. Requests
//! outside the supported calendar fail instead of being clamped.

pub mod composite;
pub mod median;

#[cfg(test)]
pub mod tests;

use crate::calendar::{last_day_of_month, last_day_of_previous_month};
use crate::config::{SearchPaths, SeaIceConfig};
use crate::error::{Result, SeaIceError};
use crate::gridset::{GridData, Gridset, Metadata};
use crate::locator::{FileLocator, periods_from_paths};
use crate::models::{Hemisphere, Period, Temporality};
use crate::reader::read_concentration_grid;
use crate::reduction::mean_or_flag;
use chrono::{Days, Local, NaiveDate};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Builds raw gridsets; filtering is left to the caller
pub struct GridsetBuilder {
    config: Arc<SeaIceConfig>,
    locator: Arc<FileLocator>,
    today: Option<NaiveDate>,
}

impl GridsetBuilder {
    pub fn new(config: Arc<SeaIceConfig>, locator: Arc<FileLocator>) -> Self {
        Self {
            config,
            locator,
            today: None,
        }
    }

    /// Pin the date treated as today, which bounds every request
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &SeaIceConfig {
        &self.config
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Last day of the most recent complete month
    pub fn last_complete_day(&self) -> NaiveDate {
        last_day_of_previous_month(self.today())
    }

    /// Daily requests must fall on or after the era start and before today
    pub fn validate_date(&self, date: NaiveDate) -> Result<()> {
        if self.config.satellite_era_start <= date && date < self.today() {
            Ok(())
        } else {
            Err(SeaIceError::DateOutOfRange { date })
        }
    }

    /// The month must end within the era and no later than the last
    /// complete month
    pub fn validate_year_month(&self, year: i32, month: u32) -> Result<()> {
        let last_day = last_day_of_month(year, month)?;
        if self.config.satellite_era_start <= last_day && last_day <= self.last_complete_day() {
            Ok(())
        } else {
            Err(SeaIceError::YearMonthOutOfRange { year, month })
        }
    }

    /// Read each path, reading repeated paths only once
    fn read_grids(&self, hemisphere: Hemisphere, paths: &[PathBuf]) -> Result<Vec<Array2<f64>>> {
        let spec = self.config.grid_spec(hemisphere);
        let mut read: HashMap<&PathBuf, Array2<f64>> = HashMap::new();
        let mut grids = Vec::with_capacity(paths.len());
        for path in paths {
            let grid = match read.get(path) {
                Some(grid) => grid.clone(),
                None => {
                    let grid = read_concentration_grid(path, spec)?;
                    read.insert(path, grid.clone());
                    grid
                }
            };
            grids.push(grid);
        }
        Ok(grids)
    }

    /// One layer per file, in list order, with periods parsed from names
    pub fn gridset_from_files(
        &self,
        hemisphere: Hemisphere,
        paths: &[PathBuf],
        temporality: Temporality,
    ) -> Result<Gridset> {
        let periods = periods_from_paths(paths)?;
        let grids = self.read_grids(hemisphere, paths)?;
        let data = GridData::from_layers(grids)?;

        let mut metadata = Metadata::new(hemisphere, temporality, self.config.grid_spec(hemisphere));
        metadata.files = paths.to_vec();
        metadata.periods = periods;
        Ok(Gridset::new(data, metadata))
    }

    /// Flag-aware average of the files into a single grid
    pub fn average_of_files(
        &self,
        hemisphere: Hemisphere,
        paths: &[PathBuf],
        temporality: Temporality,
    ) -> Result<Gridset> {
        let stacked = self.gridset_from_files(hemisphere, paths, temporality)?;
        let metadata = &stacked.metadata;
        let grid = mean_or_flag(
            stacked.data.as_stack(),
            metadata.valid_range,
            metadata.missing_value,
        );
        Ok(stacked.with_data(GridData::Grid(grid)))
    }

    fn empty(&self, hemisphere: Hemisphere, temporality: Temporality, period: Option<Period>) -> Gridset {
        debug!("Creating empty {temporality:?} gridset for {hemisphere} {period:?}");
        Gridset::empty(self.config.grid_spec(hemisphere), hemisphere, temporality, period)
    }

    /// Daily concentration with neighbors within `interpolation_radius` days
    /// stacked alongside the target day
    pub fn concentration_daily(
        &self,
        hemisphere: Hemisphere,
        date: NaiveDate,
        roots: &SearchPaths,
        interpolation_radius: u32,
    ) -> Result<Gridset> {
        self.validate_date(date)?;

        let radius = Days::new(u64::from(interpolation_radius));
        let start = date.checked_sub_days(radius).unwrap_or(date);
        let end = date.checked_add_days(radius).unwrap_or(date);
        let files = self.locator.daily_file_paths(hemisphere, start, end, roots)?;

        let mut gridset = if files.is_empty() {
            self.empty(hemisphere, Temporality::Daily, Some(Period::Day(date)))
        } else {
            self.gridset_from_files(hemisphere, &files, Temporality::Daily)?
        };
        gridset.metadata.period = Some(Period::Day(date));
        Ok(gridset)
    }

    /// Average of every daily file in an inclusive range, SMMR weighted
    pub fn concentration_daily_average(
        &self,
        hemisphere: Hemisphere,
        start: NaiveDate,
        end: NaiveDate,
        roots: &SearchPaths,
    ) -> Result<Gridset> {
        let files = self
            .locator
            .weighted_daily_file_paths(hemisphere, start, end, roots)?;
        if files.is_empty() {
            return Ok(self.empty(hemisphere, Temporality::Daily, None));
        }
        self.average_of_files(hemisphere, &files, Temporality::Daily)
    }
}
