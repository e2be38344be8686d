//! The individual filters. Each takes a gridset by reference and returns a
//! new one.

use crate::calendar::days_in_month;
use crate::error::{Result, SeaIceError};
use crate::gridset::{GridData, Gridset, Product};
use crate::models::{Period, Temporality, ValidRange};
use crate::reduction::{any_layer_equals, fill_missing, mean_or_flag};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayViewMut2, Axis, Zip};
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

/// Copy of `data` with `f` run over every layer in place
fn map_layers(data: &GridData, mut f: impl FnMut(ArrayViewMut2<f64>)) -> GridData {
    let mut out = data.clone();
    match &mut out {
        GridData::Grid(grid) => f(grid.view_mut()),
        GridData::Stack(stack) => {
            for layer in stack.axis_iter_mut(Axis(0)) {
                f(layer);
            }
        }
    }
    out
}

/// Uniformly missing gridset keeping the input's request metadata
fn empty_like(gridset: &Gridset) -> Gridset {
    let mut metadata = gridset.metadata.clone();
    metadata.files.clear();
    metadata.periods.clear();
    metadata.empty_gridset = true;
    metadata.valid_range = ValidRange::new(0.0, 100.0);
    let grid = Array2::from_elem(gridset.grid_shape(), metadata.missing_value);
    Gridset::new(GridData::Grid(grid), metadata)
}

/// Land and coast become zero concentration
pub fn drop_land(gridset: &Gridset) -> Gridset {
    let flags = gridset.metadata.flags;
    let data = gridset.data.mapv(|v| {
        if v == flags.land || v == flags.coast {
            0.0
        } else {
            v
        }
    });
    let mut out = gridset.with_data(data);
    out.metadata.drop_land = true;
    out
}

/// Remove daily layers whose date is listed as bad.
///
/// Repeated layers for the same date are removed together. When nothing
/// is left the result is the empty gridset for the same request.
pub fn drop_bad_dates(gridset: &Gridset, bad_dates: &BTreeSet<NaiveDate>) -> Result<Gridset> {
    if gridset.metadata.temporality != Temporality::Daily {
        warn!(
            "Bad dates can only be dropped from daily gridsets, not {:?}; passing through",
            gridset.metadata.temporality
        );
        return Ok(gridset.clone());
    }

    let periods = &gridset.metadata.periods;
    if periods.is_empty() || periods.len() != gridset.data.depth() {
        return Ok(gridset.clone());
    }

    let keep: Vec<usize> = periods
        .iter()
        .enumerate()
        .filter(|(_, period)| !period.date().is_some_and(|date| bad_dates.contains(&date)))
        .map(|(index, _)| index)
        .collect();

    if keep.len() == periods.len() {
        return Ok(gridset.clone());
    }
    if keep.is_empty() {
        debug!("Every layer fell on a bad date; returning empty gridset");
        return Ok(empty_like(gridset));
    }

    let mut out = gridset.with_data(gridset.data.select_layers(&keep)?);
    out.metadata.files = keep
        .iter()
        .filter_map(|i| gridset.metadata.files.get(*i).cloned())
        .collect();
    out.metadata.periods = keep.iter().map(|i| periods[*i]).collect();
    Ok(out)
}

fn target_index(periods: &[Period], date: NaiveDate) -> Result<usize> {
    periods
        .iter()
        .position(|period| *period == Period::Day(date))
        .ok_or(SeaIceError::IndexNotFound { date })
}

/// Fill the requested day's missing cells from the other layers.
///
/// The result is always a single grid. If the neighbors changed nothing,
/// provenance shrinks to the target file alone. Without a target file
/// every layer is reduced instead.
pub fn interpolate(gridset: &Gridset) -> Result<Gridset> {
    let depth = gridset.data.depth();
    if depth <= 1 {
        return Ok(gridset.clone());
    }
    let Some(Period::Day(date)) = gridset.metadata.period else {
        warn!("Interpolation needs a daily target period; passing through");
        return Ok(gridset.clone());
    };

    let valid_range = gridset.metadata.valid_range;
    let missing = gridset.metadata.missing_value;

    match target_index(&gridset.metadata.periods, date) {
        Ok(index) => {
            let others: Vec<usize> = (0..depth).filter(|i| *i != index).collect();
            let others = gridset.data.select_layers(&others)?;
            let target = gridset
                .data
                .layer(index)
                .ok_or(SeaIceError::IndexNotFound { date })?;

            let filled = fill_missing(target, others.as_stack(), valid_range, missing);
            let unchanged = filled == target;

            let mut out = gridset.with_data(GridData::Grid(filled));
            if unchanged {
                out.metadata.files = gridset.metadata.files.get(index).cloned().into_iter().collect();
                out.metadata.periods = vec![gridset.metadata.periods[index]];
            }
            Ok(out)
        }
        Err(err) => {
            error!("{err}; interpolating from all {depth} layers");
            let grid = mean_or_flag(gridset.data.as_stack(), valid_range, missing);
            Ok(gridset.with_data(GridData::Grid(grid)))
        }
    }
}

/// Zero concentration, and missing, inside the invalid-ice mask.
///
/// Layers that are missing everywhere are left alone so that an absent
/// day does not turn into open water.
pub fn drop_invalid_ice(gridset: &Gridset, mask: &Array2<bool>) -> Result<Gridset> {
    if gridset.is_uniformly_missing() {
        debug!("Skipping invalid ice mask for uniformly missing gridset");
        return Ok(gridset.clone());
    }
    if mask.dim() != gridset.grid_shape() {
        return Err(SeaIceError::ShapeMismatch {
            expected: gridset.grid_shape(),
            found: mask.dim(),
        });
    }

    let valid_range = gridset.metadata.valid_range;
    let missing = gridset.metadata.missing_value;
    let data = map_layers(&gridset.data, |mut layer| {
        if layer.iter().all(|v| *v == missing) {
            return;
        }
        Zip::from(&mut layer).and(mask).for_each(|value, &invalid| {
            if invalid && (valid_range.contains(*value) || *value == missing) {
                *value = 0.0;
            }
        });
    });

    let mut out = gridset.with_data(data);
    out.metadata.drop_invalid_ice = true;
    Ok(out)
}

/// Apply the union of every layer's pole hole to each layer that has data
pub fn largest_pole_hole(gridset: &Gridset) -> Gridset {
    let GridData::Stack(stack) = &gridset.data else {
        return gridset.clone();
    };
    let pole = gridset.metadata.flags.pole;
    let missing = gridset.metadata.missing_value;
    let hole = any_layer_equals(stack.view(), pole);

    let data = map_layers(&gridset.data, |mut layer| {
        if layer.iter().all(|v| *v == missing) {
            return;
        }
        Zip::from(&mut layer).and(&hole).for_each(|value, &in_hole| {
            if in_hole {
                *value = pole;
            }
        });
    });
    gridset.with_data(data)
}

pub fn concentration_cutoff(gridset: &Gridset, cutoff: f64) -> Gridset {
    gridset.with_data(gridset.data.mapv(|v| if v < cutoff { 0.0 } else { v }))
}

/// Threshold concentration into extent.
///
/// Data at or above `threshold` and the pole hole become 1; other flags
/// and missing pass through; everything else becomes 0.
pub fn concentration_to_extent(gridset: &Gridset, threshold: f64) -> Gridset {
    let flags = gridset.metadata.flags;
    let valid_max = gridset.metadata.valid_range.max;
    let data = gridset.data.mapv(|v| {
        if (threshold <= v && v <= valid_max) || v == flags.pole {
            1.0
        } else if flags.is_sentinel(v) {
            v
        } else {
            0.0
        }
    });

    let mut out = gridset.with_data(data);
    out.metadata.valid_range = ValidRange::new(0.0, 1.0);
    out.metadata.product = Product::Extent;
    out
}

/// A month built from daily files must have one file per calendar day
pub fn require_full_month(gridset: &Gridset) -> Result<Gridset> {
    let metadata = &gridset.metadata;
    if metadata.temporality != Temporality::Monthly {
        warn!(
            "Full month check applied to a {:?} gridset; passing through",
            metadata.temporality
        );
        return Ok(gridset.clone());
    }
    if !metadata.has_daily_periods() {
        return Ok(gridset.clone());
    }
    let Some(period) = metadata.period else {
        return Ok(gridset.clone());
    };

    let (year, month) = (period.year(), period.month());
    let expected = days_in_month(year, month)? as usize;
    let found = metadata.files.len();
    if found != expected {
        return Err(SeaIceError::IncompleteMonth {
            year,
            month,
            expected,
            found,
        });
    }
    Ok(gridset.clone())
}

pub fn forbid_empty(gridset: &Gridset) -> Result<Gridset> {
    if gridset.metadata.empty_gridset || gridset.data.is_empty() || gridset.is_uniformly_missing() {
        return Err(SeaIceError::NoData);
    }
    Ok(gridset.clone())
}
