//! Monthly, seasonal and multi-year composites.

use super::GridsetBuilder;
use crate::calendar::last_day_of_month;
use crate::config::{GridSpec, SearchPaths};
use crate::error::Result;
use crate::gridset::{GridData, Gridset, Metadata};
use crate::models::{Hemisphere, Period, Temporality, ValidRange};
use crate::reduction::mean_or_flag;
use ndarray::Array2;
use tracing::{info, warn};

impl GridsetBuilder {
    /// Monthly concentration.
    ///
    /// A canonical monthly file is used when one exists and the month lies
    /// within the final-data era; otherwise the month's daily files are
    /// averaged. Too few daily files yields the empty monthly gridset.
    pub fn concentration_monthly(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        roots: &SearchPaths,
        min_days_for_valid_month: usize,
    ) -> Result<Gridset> {
        self.validate_year_month(year, month)?;
        let period = Period::month_of(year, month);

        let monthly_path = self
            .locator
            .monthly_file_path(hemisphere, year, month, roots)?;
        let daily_paths = self
            .locator
            .weighted_daily_file_paths_for_month(hemisphere, year, month, roots)?;

        if daily_paths.len() < min_days_for_valid_month {
            warn!(
                "Insufficient daily files found for {year:04}-{month:02} ({} of {}); returning empty monthly gridset",
                daily_paths.len(),
                min_days_for_valid_month
            );
            return Ok(self.empty(hemisphere, Temporality::Monthly, Some(period)));
        }

        let use_final_monthly =
            last_day_of_month(year, month)? <= self.config.last_day_with_valid_final_data;

        let mut gridset = match monthly_path {
            Some(path) if use_final_monthly => {
                self.gridset_from_files(hemisphere, &[path], Temporality::Monthly)?
            }
            _ => self.average_of_files(hemisphere, &daily_paths, Temporality::Monthly)?,
        };
        gridset.metadata.period = Some(period);
        Ok(gridset)
    }

    /// Seasonal concentration averaged from its monthly gridsets.
    ///
    /// Months numbered after the season's last month belong to the previous
    /// calendar year, so December counts toward the following winter.
    pub fn concentration_seasonal(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        months: [u32; 3],
        roots: &SearchPaths,
        min_days_for_valid_month: usize,
    ) -> Result<Gridset> {
        let last_month = months[2];
        let mut monthly = Vec::with_capacity(months.len());
        for month in months {
            let month_year = if month > last_month { year - 1 } else { year };
            info!(
                "Getting monthly concentration {} {:04}-{:02}",
                hemisphere, month_year, month
            );
            monthly.push(self.concentration_monthly(
                hemisphere,
                month_year,
                month,
                roots,
                min_days_for_valid_month,
            )?);
        }

        let stacked = stack_gridsets(
            self.config.grid_spec(hemisphere),
            hemisphere,
            Temporality::Seasonal,
            &monthly,
        )?;
        let grid = mean_or_flag(
            stacked.data.as_stack(),
            stacked.metadata.valid_range,
            stacked.metadata.missing_value,
        );

        let mut metadata = stacked.metadata;
        metadata.season = Some((year, months));
        metadata.valid_range = ValidRange::new(0.0, 100.0);
        Ok(Gridset::new(GridData::Grid(grid), metadata))
    }

    /// One monthly gridset per year, stacked in year order
    pub fn concentration_monthly_over_years(
        &self,
        hemisphere: Hemisphere,
        start_year: i32,
        end_year: i32,
        month: u32,
        roots: &SearchPaths,
        min_days_for_valid_month: usize,
    ) -> Result<Gridset> {
        let gridsets = (start_year..=end_year)
            .map(|year| {
                self.concentration_monthly(hemisphere, year, month, roots, min_days_for_valid_month)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut stacked = stack_gridsets(
            self.config.grid_spec(hemisphere),
            hemisphere,
            Temporality::Monthly,
            &gridsets,
        )?;
        stacked.metadata.years = (start_year..=end_year).collect();
        Ok(stacked)
    }

    /// One seasonal gridset per year, stacked in year order
    pub fn concentration_seasonal_over_years(
        &self,
        hemisphere: Hemisphere,
        start_year: i32,
        end_year: i32,
        months: [u32; 3],
        roots: &SearchPaths,
        min_days_for_valid_month: usize,
    ) -> Result<Gridset> {
        let gridsets = (start_year..=end_year)
            .map(|year| {
                self.concentration_seasonal(hemisphere, year, months, roots, min_days_for_valid_month)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut stacked = stack_gridsets(
            self.config.grid_spec(hemisphere),
            hemisphere,
            Temporality::Seasonal,
            &gridsets,
        )?;
        stacked.metadata.years = (start_year..=end_year).collect();
        Ok(stacked)
    }
}

/// Stack single-grid gridsets depth-wise, concatenating provenance in order
pub(crate) fn stack_gridsets(
    spec: &GridSpec,
    hemisphere: Hemisphere,
    temporality: Temporality,
    gridsets: &[Gridset],
) -> Result<Gridset> {
    let mut metadata = Metadata::new(hemisphere, temporality, spec);

    let mut layers: Vec<Array2<f64>> = Vec::with_capacity(gridsets.len());
    for gridset in gridsets {
        for layer in gridset.data.layers() {
            layers.push(layer.to_owned());
        }
        metadata.files.extend(gridset.metadata.files.iter().cloned());
        metadata.periods.extend(gridset.metadata.periods.iter().copied());
        metadata.layer_provenance.push(gridset.metadata.provenance());
    }
    if let Some(first) = gridsets.first() {
        metadata.valid_range = first.metadata.valid_range;
        metadata.flags = first.metadata.flags;
        metadata.missing_value = first.metadata.missing_value;
    }

    let data = GridData::from_layers(layers)?;
    Ok(Gridset::new(data, metadata))
}
