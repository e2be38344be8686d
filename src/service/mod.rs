//! Public request facade.
//!
//! [`GridsetService`] owns the configuration, the locator and its listing
//! cache, the builder, and the external mask and bad-date sources. Every
//! request builds a raw gridset through the builder and then runs the
//! single ordering-aware filter pipeline for the options it was given.

pub mod anomaly;
pub mod options;
pub mod trends;

#[cfg(test)]
pub mod tests;

pub use options::{AverageOptions, DailyMedianOptions, DailyOptions, MonthlyOptions};

use crate::builder::GridsetBuilder;
use crate::builder::median::extent_median_of;
use crate::calendar::{date_range, most_common_month};
use crate::config::{SearchPaths, SeaIceConfig};
use crate::error::Result;
use crate::external::{
    BadDateList, BadDateSource, InMemoryInvalidIceMasks, InvalidIceMaskSource,
    day_of_year_invalid_ice_mask, seasonal_invalid_ice_mask,
};
use crate::filters::{FilterOptions, FilterPipeline};
use crate::gridset::Gridset;
use crate::locator::{CacheStats, FileLocator};
use crate::models::{Hemisphere, Period, Temporality};
use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use std::sync::Arc;
use tracing::info;

pub struct GridsetService {
    config: Arc<SeaIceConfig>,
    locator: Arc<FileLocator>,
    builder: GridsetBuilder,
    invalid_ice: Box<dyn InvalidIceMaskSource>,
    bad_dates: Box<dyn BadDateSource>,
    search_paths: SearchPaths,
}

impl GridsetService {
    /// Service with no invalid-ice masks, no bad dates and the configured
    /// default search paths
    pub fn new(config: SeaIceConfig) -> Result<Self> {
        config.validate()?;
        let search_paths = config.default_search_paths();
        let config = Arc::new(config);
        let locator = Arc::new(FileLocator::new(config.clone())?);
        let builder = GridsetBuilder::new(config.clone(), locator.clone());

        Ok(Self {
            config,
            locator,
            builder,
            invalid_ice: Box::new(InMemoryInvalidIceMasks::new()),
            bad_dates: Box::new(BadDateList::new()),
            search_paths,
        })
    }

    pub fn with_invalid_ice_masks(mut self, source: impl InvalidIceMaskSource + 'static) -> Self {
        self.invalid_ice = Box::new(source);
        self
    }

    pub fn with_bad_dates(mut self, source: impl BadDateSource + 'static) -> Self {
        self.bad_dates = Box::new(source);
        self
    }

    /// Replace the default search paths used when a request names none
    pub fn with_search_paths(mut self, search_paths: SearchPaths) -> Self {
        self.search_paths = search_paths;
        self
    }

    /// Pin the date treated as today
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.builder = self.builder.with_today(today);
        self
    }

    pub fn config(&self) -> &SeaIceConfig {
        &self.config
    }

    pub fn builder(&self) -> &GridsetBuilder {
        &self.builder
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search_paths
    }

    /// Forget cached directory listings after the archive changes on disk
    pub fn invalidate_cache(&self) {
        self.locator.invalidate();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.locator.cache_stats()
    }

    fn roots<'a>(&'a self, requested: Option<&'a SearchPaths>) -> &'a SearchPaths {
        requested.unwrap_or(&self.search_paths)
    }

    fn month_mask(
        &self,
        enabled: bool,
        hemisphere: Hemisphere,
        month: u32,
    ) -> Result<Option<Array2<bool>>> {
        if enabled {
            self.invalid_ice.invalid_ice_mask(hemisphere, month)
        } else {
            Ok(None)
        }
    }

    fn daily_filter_options(
        &self,
        hemisphere: Hemisphere,
        date: NaiveDate,
        options: &DailyOptions,
    ) -> Result<FilterOptions> {
        let mut filters = FilterOptions::new()
            .with_drop_land(options.drop_land)
            .with_interpolation(options.interpolation_radius > 0)
            .with_invalid_ice_mask(self.month_mask(
                options.drop_invalid_ice,
                hemisphere,
                date.month(),
            )?)
            .with_forbid_empty(!options.allow_empty_gridset);
        if !options.allow_bad_dates {
            filters = filters.with_bad_dates(self.bad_dates.bad_dates(hemisphere)?);
        }
        Ok(filters)
    }

    fn monthly_filter_options(
        &self,
        hemisphere: Hemisphere,
        month: u32,
        options: &MonthlyOptions,
    ) -> Result<FilterOptions> {
        Ok(FilterOptions::new()
            .with_drop_land(options.drop_land)
            .with_invalid_ice_mask(self.month_mask(options.drop_invalid_ice, hemisphere, month)?)
            .with_require_full_month(options.require_full_month)
            .with_forbid_empty(!options.allow_empty_gridset))
    }

    fn min_days(&self, options: &MonthlyOptions) -> usize {
        options
            .min_days_for_valid_month
            .unwrap_or(self.config.min_days_for_valid_month)
    }

    /// Daily concentration for one date
    pub fn concentration_daily(
        &self,
        hemisphere: Hemisphere,
        date: NaiveDate,
        options: &DailyOptions,
    ) -> Result<Gridset> {
        let roots = self.roots(options.search_paths.as_ref());
        let gridset = self
            .builder
            .concentration_daily(hemisphere, date, roots, options.interpolation_radius)?;
        let filters = self.daily_filter_options(hemisphere, date, options)?;
        FilterPipeline::from_options(filters).apply(&gridset)
    }

    /// Daily extent; `None` uses the configured threshold
    pub fn extent_daily(
        &self,
        hemisphere: Hemisphere,
        date: NaiveDate,
        options: &DailyOptions,
        extent_threshold: Option<f64>,
    ) -> Result<Gridset> {
        let roots = self.roots(options.search_paths.as_ref());
        let gridset = self
            .builder
            .concentration_daily(hemisphere, date, roots, options.interpolation_radius)?;
        let filters = self
            .daily_filter_options(hemisphere, date, options)?
            .with_extent_threshold(extent_threshold.unwrap_or(self.config.extent_threshold));
        FilterPipeline::from_options(filters).apply(&gridset)
    }

    /// Average of every daily file in an inclusive date range.
    ///
    /// The invalid-ice mask is the one for the month most of the range
    /// falls in.
    pub fn concentration_daily_average_over_date_range(
        &self,
        hemisphere: Hemisphere,
        start: NaiveDate,
        end: NaiveDate,
        options: &AverageOptions,
    ) -> Result<Gridset> {
        self.builder.validate_date(start)?;
        self.builder.validate_date(end)?;

        let roots = self.roots(options.search_paths.as_ref());
        let gridset = self
            .builder
            .concentration_daily_average(hemisphere, start, end, roots)?;

        let mask = match most_common_month(&date_range(start, end)) {
            Some(month) => self.month_mask(options.drop_invalid_ice, hemisphere, month)?,
            None => None,
        };
        let filters = FilterOptions::new()
            .with_drop_land(options.drop_land)
            .with_invalid_ice_mask(mask)
            .with_forbid_empty(!options.allow_empty_gridset);
        FilterPipeline::from_options(filters).apply(&gridset)
    }

    /// Raw monthly gridset, empty for months listed as bad
    fn raw_monthly(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        roots: &SearchPaths,
        min_days: usize,
    ) -> Result<Gridset> {
        if self.config.is_bad_concentration_month(hemisphere, year, month) {
            self.builder.validate_year_month(year, month)?;
            info!("{hemisphere} {year:04}-{month:02} is listed as bad; returning empty gridset");
            return Ok(Gridset::empty(
                self.config.grid_spec(hemisphere),
                hemisphere,
                Temporality::Monthly,
                Some(Period::month_of(year, month)),
            ));
        }
        self.builder
            .concentration_monthly(hemisphere, year, month, roots, min_days)
    }

    pub fn concentration_monthly(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        options: &MonthlyOptions,
    ) -> Result<Gridset> {
        let roots = self.roots(options.search_paths.as_ref());
        let gridset = self.raw_monthly(hemisphere, year, month, roots, self.min_days(options))?;
        let filters = self.monthly_filter_options(hemisphere, month, options)?;
        FilterPipeline::from_options(filters).apply(&gridset)
    }

    /// Monthly extent; `None` uses the configured threshold
    pub fn extent_monthly(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        options: &MonthlyOptions,
        extent_threshold: Option<f64>,
    ) -> Result<Gridset> {
        let roots = self.roots(options.search_paths.as_ref());
        let gridset = self.raw_monthly(hemisphere, year, month, roots, self.min_days(options))?;
        let filters = self
            .monthly_filter_options(hemisphere, month, options)?
            .with_extent_threshold(extent_threshold.unwrap_or(self.config.extent_threshold));
        FilterPipeline::from_options(filters).apply(&gridset)
    }

    /// Median monthly extent across an inclusive range of years
    pub fn extent_monthly_median(
        &self,
        hemisphere: Hemisphere,
        start_year: i32,
        end_year: i32,
        month: u32,
        options: &MonthlyOptions,
        extent_threshold: Option<f64>,
    ) -> Result<Gridset> {
        let roots = self.roots(options.search_paths.as_ref());
        let min_days = self.min_days(options);
        let to_extent = FilterPipeline::from_options(
            FilterOptions::new()
                .with_extent_threshold(extent_threshold.unwrap_or(self.config.extent_threshold)),
        );

        let yearly = (start_year..=end_year)
            .map(|year| {
                let monthly = self.raw_monthly(hemisphere, year, month, roots, min_days)?;
                to_extent.apply(&monthly)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut median = extent_median_of(
            self.config.grid_spec(hemisphere),
            hemisphere,
            Temporality::Monthly,
            &yearly,
        )?;
        median.metadata.years = (start_year..=end_year).collect();

        let filters = FilterOptions::new()
            .with_drop_land(options.drop_land)
            .with_invalid_ice_mask(self.month_mask(options.drop_invalid_ice, hemisphere, month)?)
            .with_forbid_empty(!options.allow_empty_gridset);
        FilterPipeline::from_options(filters).apply(&median)
    }

    /// Median daily extent for one day of year across an inclusive range
    /// of years
    pub fn extent_daily_median(
        &self,
        hemisphere: Hemisphere,
        start_year: i32,
        end_year: i32,
        day_of_year: u32,
        options: &DailyMedianOptions,
    ) -> Result<Gridset> {
        let roots = self.roots(options.search_paths.as_ref());
        let mut per_day = FilterOptions::new()
            .with_interpolation(options.interpolation_radius > 0)
            .with_extent_threshold(
                options
                    .extent_threshold
                    .unwrap_or(self.config.extent_threshold),
            );
        if !options.allow_bad_dates {
            per_day = per_day.with_bad_dates(self.bad_dates.bad_dates(hemisphere)?);
        }
        let per_day = FilterPipeline::from_options(per_day);

        let yearly = self
            .builder
            .daily_gridsets_for_day_of_year(
                hemisphere,
                start_year,
                end_year,
                day_of_year,
                roots,
                options.interpolation_radius,
            )?
            .iter()
            .map(|daily| per_day.apply(daily))
            .collect::<Result<Vec<_>>>()?;

        let mut median = extent_median_of(
            self.config.grid_spec(hemisphere),
            hemisphere,
            Temporality::Daily,
            &yearly,
        )?;
        median.metadata.years = (start_year..=end_year).collect();
        median.metadata.day_of_year = Some(day_of_year);

        let mask = if options.drop_invalid_ice {
            day_of_year_invalid_ice_mask(
                self.invalid_ice.as_ref(),
                hemisphere,
                start_year,
                end_year,
                day_of_year,
            )?
        } else {
            None
        };
        let filters = FilterOptions::new()
            .with_drop_land(options.drop_land)
            .with_invalid_ice_mask(mask)
            .with_forbid_empty(!options.allow_empty_gridset);
        FilterPipeline::from_options(filters).apply(&median)
    }

    /// Seasonal concentration for a named season
    pub fn concentration_seasonal(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        season: &str,
        options: &MonthlyOptions,
    ) -> Result<Gridset> {
        let months = self.config.season_months(season)?;
        let roots = self.roots(options.search_paths.as_ref());
        let gridset = self.builder.concentration_seasonal(
            hemisphere,
            year,
            months,
            roots,
            self.min_days(options),
        )?;

        let mask = if options.drop_invalid_ice {
            seasonal_invalid_ice_mask(self.invalid_ice.as_ref(), hemisphere, &months)?
        } else {
            None
        };
        let filters = FilterOptions::new()
            .with_drop_land(options.drop_land)
            .with_invalid_ice_mask(mask)
            .with_forbid_empty(!options.allow_empty_gridset);
        FilterPipeline::from_options(filters).apply(&gridset)
    }
}
