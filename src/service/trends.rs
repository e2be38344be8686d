//! Monthly and seasonal decadal trends.

use super::{DailyOptions, GridsetService};
use crate::config::validate_season;
use crate::error::Result;
use crate::external::seasonal_invalid_ice_mask;
use crate::filters::{FilterOptions, FilterPipeline};
use crate::gridset::{GridData, Gridset, Product, Provenance};
use crate::models::{Hemisphere, Period};
use crate::reduction::{resolve_stack, standard_deviation};
use crate::trend::dates::{
    group_by_season_year, group_by_year, monthly_trend_dates, season_year, seasonal_trend_dates,
    year_span,
};
use crate::trend::{
    TrendEstimator, TrendSettings, apply_flag_resolution, flags_to_nan,
    weights_from_standard_deviation,
};
use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use tracing::{debug, info};

impl GridsetService {
    /// Trend of one calendar month's concentration through `year`.
    ///
    /// Years run from the later of the first complete month of coverage
    /// and `trend_start_year`. Years with too few daily files get no
    /// weight.
    pub fn concentration_monthly_trend(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        trend_start_year: Option<i32>,
        clipping_threshold: f64,
    ) -> Result<Gridset> {
        let dates = monthly_trend_dates(
            self.config.satellite_era_start_monthly,
            self.builder.last_complete_day(),
            year,
            month,
            trend_start_year,
        );
        let (first_year, last_year) = year_span(&dates, |date| date.year())?;
        info!("Computing {hemisphere} month {month:02} trend for {first_year}-{last_year}");

        let roots = &self.search_paths;
        let min_days = self.config.min_days_for_valid_month;
        let groups = group_by_year(&dates);
        let mut variability = Provenance::default();
        let mut deviations = Vec::new();
        for trend_year in first_year..=last_year {
            let daily_files = self
                .locator
                .weighted_daily_file_paths_for_month(hemisphere, trend_year, month, roots)?;
            if daily_files.len() < min_days {
                debug!(
                    "Only {} daily files for {trend_year:04}-{month:02}; year gets no weight",
                    daily_files.len()
                );
                deviations.push(self.nan_layer(hemisphere));
                continue;
            }
            let days = groups.get(&trend_year).map(Vec::as_slice).unwrap_or_default();
            deviations.push(self.daily_standard_deviation(hemisphere, days, &mut variability)?);
        }

        let concentration = self.builder.concentration_monthly_over_years(
            hemisphere,
            first_year,
            last_year,
            month,
            roots,
            min_days,
        )?;
        let mask = self.invalid_ice.invalid_ice_mask(hemisphere, month)?;

        let mut trend =
            self.trend_from_stack(&concentration, mask, deviations, clipping_threshold)?;
        trend.metadata.product = Product::MonthlyTrend;
        trend.metadata.period = Some(Period::month_of(year, month));
        trend.metadata.variability = Some(variability);
        Ok(trend)
    }

    /// Trend of a named season's concentration through `year`
    pub fn concentration_seasonal_trend(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        season: &str,
        clipping_threshold: f64,
    ) -> Result<Gridset> {
        let months = self.config.season_months(season)?;
        self.seasonal_trend_for_months(hemisphere, year, &months, clipping_threshold)
    }

    /// Trend of an explicit three-month season through `year`
    pub fn seasonal_trend_for_months(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        months: &[u32],
        clipping_threshold: f64,
    ) -> Result<Gridset> {
        let months = validate_season(months)?;
        let dates = seasonal_trend_dates(
            self.config.satellite_era_start_monthly,
            self.builder.last_complete_day(),
            year,
            &months,
        )?;
        let (first_year, last_year) = year_span(&dates, |date| season_year(date, &months))?;
        info!("Computing {hemisphere} season {months:?} trend for {first_year}-{last_year}");

        let groups = group_by_season_year(&dates, &months);
        let mut variability = Provenance::default();
        let mut deviations = Vec::new();
        for trend_year in first_year..=last_year {
            let deviation = match groups.get(&trend_year) {
                Some(days) => self.daily_standard_deviation(hemisphere, days, &mut variability)?,
                None => self.nan_layer(hemisphere),
            };
            deviations.push(deviation);
        }

        let concentration = self.builder.concentration_seasonal_over_years(
            hemisphere,
            first_year,
            last_year,
            months,
            &self.search_paths,
            self.config.min_days_for_valid_month,
        )?;
        let mask = seasonal_invalid_ice_mask(self.invalid_ice.as_ref(), hemisphere, &months)?;

        let mut trend =
            self.trend_from_stack(&concentration, mask, deviations, clipping_threshold)?;
        trend.metadata.product = Product::SeasonalTrend;
        trend.metadata.season = Some((year, months));
        trend.metadata.variability = Some(variability);
        Ok(trend)
    }

    fn nan_layer(&self, hemisphere: Hemisphere) -> Array2<f64> {
        Array2::from_elem(self.config.grid_spec(hemisphere).shape, f64::NAN)
    }

    /// Standard deviation of the days' concentration.
    ///
    /// Bad dates and invalid ice are dropped, empty days are skipped and
    /// SMMR days count twice. Flags take no part.
    fn daily_standard_deviation(
        &self,
        hemisphere: Hemisphere,
        days: &[NaiveDate],
        variability: &mut Provenance,
    ) -> Result<Array2<f64>> {
        let options = DailyOptions::default()
            .with_allow_bad_dates(false)
            .with_drop_invalid_ice(true);

        let mut layers = Vec::new();
        for date in days {
            let daily = self.concentration_daily(hemisphere, *date, &options)?;
            if daily.metadata.empty_gridset {
                continue;
            }
            let repeats = match daily.metadata.files.first() {
                Some(path) if self.locator.is_smmr_path(path) => 2,
                _ => 1,
            };
            for layer in daily.data.layers() {
                for _ in 0..repeats {
                    layers.push(layer.to_owned());
                }
            }
            for _ in 0..repeats {
                variability.files.extend(daily.metadata.files.iter().cloned());
                variability.periods.push(Period::Day(*date));
            }
        }

        if layers.is_empty() {
            return Ok(self.nan_layer(hemisphere));
        }
        let stack = GridData::from_layers(layers)?;
        Ok(standard_deviation(
            stack.as_stack(),
            self.config.grid_spec(hemisphere).valid_range(),
        ))
    }

    /// Mask, fit and flag a multi-year stack against its yearly deviations
    fn trend_from_stack(
        &self,
        concentration: &Gridset,
        mask: Option<Array2<bool>>,
        deviations: Vec<Array2<f64>>,
        clipping_threshold: f64,
    ) -> Result<Gridset> {
        let filters = FilterOptions::new()
            .with_invalid_ice_mask(mask)
            .with_largest_pole_hole(true);
        let stack = FilterPipeline::from_options(filters).apply(concentration)?;

        let valid_range = stack.metadata.valid_range;
        let missing = stack.metadata.missing_value;
        let layers = stack.data.as_stack();

        let deviation = GridData::from_layers(deviations)?;
        let weights = weights_from_standard_deviation(deviation.as_stack());
        let values = flags_to_nan(layers, valid_range);

        let estimator = TrendEstimator::new(
            self.config.workers,
            TrendSettings {
                clipping_threshold,
                min_points: self.config.min_trend_points,
                max_p_value: self.config.max_f_test_p_value,
            },
        )?;
        let trend = estimator.estimate(values.view(), weights.view())?;
        let resolution = resolve_stack(layers, valid_range, missing);
        let grid = apply_flag_resolution(&trend, &resolution, missing);

        let mut metadata = stack.metadata.clone();
        metadata.valid_range = valid_range.difference_range(&valid_range);
        Ok(Gridset::new(GridData::Grid(grid), metadata))
    }
}
