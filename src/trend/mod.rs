//! Per-cell decadal trends weighted by interannual variability.
//!
//! Each year contributes one concentration layer and one standard deviation
//! layer. Weights are the inverse variance of the year's daily values, so
//! noisy years pull the fit less. Every cell is fitted independently on a
//! bounded worker pool; results come back in row-major order and are
//! reshaped into the grid.

pub mod dates;
pub mod regression;

#[cfg(test)]
pub mod tests;

pub use regression::{TrendFit, TrendSettings, trend_for_cell, weighted_least_squares};

use crate::error::{Result, SeaIceError};
use crate::models::ValidRange;
use crate::parallel::worker_pool;
use crate::reduction::CellResolution;
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::debug;

/// Inverse variance; zero or NaN deviation gives zero weight
pub fn weights_from_standard_deviation(deviation: ArrayView3<f64>) -> Array3<f64> {
    deviation.mapv(|sigma| {
        if sigma.is_nan() || sigma == 0.0 {
            0.0
        } else {
            1.0 / (sigma * sigma)
        }
    })
}

/// Replace everything outside the valid range with NaN
pub fn flags_to_nan(stack: ArrayView3<f64>, valid_range: ValidRange) -> Array3<f64> {
    stack.mapv(|v| if valid_range.contains(v) { v } else { f64::NAN })
}

/// Write the flag every layer agrees on, or missing where the stack holds
/// nothing else. Cells with data or with disagreeing flags keep the trend.
pub fn apply_flag_resolution(
    trend: &Array2<f64>,
    resolution: &Array2<CellResolution>,
    missing: f64,
) -> Array2<f64> {
    Zip::from(trend)
        .and(resolution)
        .map_collect(|value, cell| match cell {
            CellResolution::Data(_) | CellResolution::Conflict => *value,
            CellResolution::Flag(flag) => *flag,
            CellResolution::Missing => missing,
        })
}

/// Fits cell trends on its own worker pool
pub struct TrendEstimator {
    pool: ThreadPool,
    settings: TrendSettings,
}

impl TrendEstimator {
    pub fn new(workers: usize, settings: TrendSettings) -> Result<Self> {
        Ok(Self {
            pool: worker_pool(workers)?,
            settings,
        })
    }

    pub fn settings(&self) -> &TrendSettings {
        &self.settings
    }

    /// Trend grid from per-year concentration and weights, both
    /// `(years, rows, cols)`
    pub fn estimate(
        &self,
        concentration: ArrayView3<f64>,
        weights: ArrayView3<f64>,
    ) -> Result<Array2<f64>> {
        if concentration.len_of(Axis(0)) != weights.len_of(Axis(0)) {
            return Err(SeaIceError::Regression {
                message: "concentration and weights cover different years".to_string(),
            });
        }
        let (_, rows, cols) = concentration.dim();
        let (_, weight_rows, weight_cols) = weights.dim();
        if (rows, cols) != (weight_rows, weight_cols) {
            return Err(SeaIceError::ShapeMismatch {
                expected: (rows, cols),
                found: (weight_rows, weight_cols),
            });
        }

        let cells: Vec<(Vec<f64>, Vec<f64>)> = concentration
            .lanes(Axis(0))
            .into_iter()
            .zip(weights.lanes(Axis(0)))
            .map(|(series, weights)| (series.to_vec(), weights.to_vec()))
            .collect();

        debug!(
            "Fitting {} cell trends on {} workers",
            cells.len(),
            self.pool.current_num_threads()
        );

        let settings = self.settings;
        let trends: Vec<f64> = self.pool.install(|| {
            cells
                .par_iter()
                .map(|(series, weights)| trend_for_cell(series, weights, &settings))
                .collect()
        });

        Ok(Array2::from_shape_vec((rows, cols), trends)?)
    }
}
