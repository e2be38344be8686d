//! Monthly concentration anomaly against a multi-year climatology.

use super::{GridsetService, MonthlyOptions};
use crate::error::{Result, SeaIceError};
use crate::filters::FilterPipeline;
use crate::gridset::{GridData, Gridset, Product};
use crate::models::Hemisphere;
use crate::reduction::{CellResolution, any_layer_equals, resolve_stack};
use ndarray::Zip;
use tracing::info;

impl GridsetService {
    /// Month concentration minus the mean of the same month over
    /// `start_year..=end_year`.
    ///
    /// Both sides have invalid ice dropped and concentration below the
    /// extent threshold zeroed. Cells without data on both sides take the
    /// climatology's flag. The pole hole is the largest seen in the month
    /// or any climatology year.
    pub fn concentration_monthly_anomaly(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        start_year: i32,
        end_year: i32,
        options: &MonthlyOptions,
    ) -> Result<Gridset> {
        info!(
            "Computing {hemisphere} {year:04}-{month:02} anomaly against {start_year}-{end_year}"
        );
        let options = MonthlyOptions {
            drop_invalid_ice: true,
            ..options.clone()
        };
        let roots = self.roots(options.search_paths.as_ref());
        let min_days = self.min_days(&options);
        let cutoff = self.config.extent_threshold;

        let raw_month = self.raw_monthly(hemisphere, year, month, roots, min_days)?;
        let month_filters = self
            .monthly_filter_options(hemisphere, month, &options)?
            .with_concentration_cutoff(cutoff);
        let month_gridset = FilterPipeline::from_options(month_filters).apply(&raw_month)?;

        let raw_climatology = self.builder.concentration_monthly_over_years(
            hemisphere,
            start_year,
            end_year,
            month,
            roots,
            min_days,
        )?;
        let climatology_filters = self
            .monthly_filter_options(hemisphere, month, &options)?
            .with_require_full_month(false)
            .with_forbid_empty(false)
            .with_largest_pole_hole(true);
        let climatology = FilterPipeline::from_options(climatology_filters).apply(&raw_climatology)?;

        let month_meta = &month_gridset.metadata;
        let clim_meta = &climatology.metadata;
        let missing = month_meta.missing_value;
        let pole = month_meta.flags.pole;

        let month_grid = month_gridset.data.layer(0).ok_or(SeaIceError::NoData)?;
        let clim_stack = climatology.data.as_stack();
        let clim_cells = resolve_stack(clim_stack, clim_meta.valid_range, clim_meta.missing_value);
        let clim_pole = any_layer_equals(clim_stack, pole);

        let mut anomaly = Zip::from(&month_grid)
            .and(&clim_cells)
            .map_collect(|&value, cell| match cell {
                CellResolution::Data(mean) if month_meta.valid_range.contains(value) => {
                    let mean = if *mean < cutoff { 0.0 } else { *mean };
                    value - mean
                }
                CellResolution::Data(_) => value,
                other => other.value(missing),
            });
        Zip::from(&mut anomaly)
            .and(&month_grid)
            .and(&clim_pole)
            .for_each(|cell, &value, &in_hole| {
                if in_hole || value == pole {
                    *cell = pole;
                }
            });

        let mut metadata = month_gridset.metadata.clone();
        metadata.product = Product::MonthlyAnomaly;
        metadata.valid_range = month_meta.valid_range.difference_range(&clim_meta.valid_range);
        metadata.years = (start_year..=end_year).collect();
        metadata.climatology = Some(clim_meta.provenance());
        metadata.layer_provenance = clim_meta.layer_provenance.clone();
        Ok(Gridset::new(GridData::Grid(anomaly), metadata))
    }
}
