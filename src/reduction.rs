//! Flag-aware per-cell reductions over grid stacks.
//!
//! Every stack cell holds either concentration inside the valid range or a
//! flag sentinel. Reductions partition each cell's values into data, the
//! missing sentinel and other flags, and never let a sentinel enter
//! arithmetic.

use crate::models::{FlagValues, ValidRange};
use ndarray::{Array2, ArrayView2, ArrayView3, Axis, Zip};

/// Resolution of one cell across all layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellResolution {
    /// Mean of the data values
    Data(f64),
    /// Every non-missing value carries this flag
    Flag(f64),
    /// No data and more than one distinct flag
    Conflict,
    /// Only missing values
    Missing,
}

/// Classify and reduce one cell's values.
///
/// Missing values never take part in flag agreement, so a layer that is
/// missing everywhere cannot hide agreement among the others.
pub fn resolve_cell<I>(values: I, valid_range: ValidRange, missing: f64) -> CellResolution
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut flag: Option<f64> = None;
    let mut conflict = false;

    for value in values {
        if valid_range.contains(value) {
            sum += value;
            count += 1;
        } else if value != missing && !value.is_nan() {
            match flag {
                None => flag = Some(value),
                Some(seen) if seen != value => conflict = true,
                Some(_) => {}
            }
        }
    }

    if count > 0 {
        CellResolution::Data(sum / count as f64)
    } else if conflict {
        CellResolution::Conflict
    } else if let Some(flag) = flag {
        CellResolution::Flag(flag)
    } else {
        CellResolution::Missing
    }
}

impl CellResolution {
    pub fn value(self, missing: f64) -> f64 {
        match self {
            CellResolution::Data(v) | CellResolution::Flag(v) => v,
            CellResolution::Conflict | CellResolution::Missing => missing,
        }
    }
}

/// Mean of data values per cell, falling back to the agreed flag, then missing
pub fn mean_or_flag(stack: ArrayView3<f64>, valid_range: ValidRange, missing: f64) -> Array2<f64> {
    Zip::from(stack.lanes(Axis(0))).map_collect(|lane| {
        resolve_cell(lane.iter().copied(), valid_range, missing).value(missing)
    })
}

/// Per-cell resolution without collapsing it to a number
pub fn resolve_stack(
    stack: ArrayView3<f64>,
    valid_range: ValidRange,
    missing: f64,
) -> Array2<CellResolution> {
    Zip::from(stack.lanes(Axis(0)))
        .map_collect(|lane| resolve_cell(lane.iter().copied(), valid_range, missing))
}

/// Replace missing cells of `target` with the reduction of `others`.
///
/// Data and flags already present in the target are preserved.
pub fn fill_missing(
    target: ArrayView2<f64>,
    others: ArrayView3<f64>,
    valid_range: ValidRange,
    missing: f64,
) -> Array2<f64> {
    if others.len_of(Axis(0)) == 0 {
        return target.to_owned();
    }
    let filler = mean_or_flag(others, valid_range, missing);
    Zip::from(target)
        .and(&filler)
        .map_collect(|&current, &fill| if current == missing { fill } else { current })
}

/// Population standard deviation of data values per cell; zero where a
/// cell has no data.
pub fn standard_deviation(stack: ArrayView3<f64>, valid_range: ValidRange) -> Array2<f64> {
    Zip::from(stack.lanes(Axis(0))).map_collect(|lane| {
        let values: Vec<f64> = lane
            .iter()
            .copied()
            .filter(|v| valid_range.contains(*v))
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    })
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Median of binary extent layers.
///
/// Values above `ice` (every flag) count as ocean for the median; a cell
/// ice in at least half of the layers is ice. A cell that is land, coast
/// or missing in every layer becomes land.
pub fn extent_median(stack: ArrayView3<f64>, ice: f64, ocean: f64, flags: &FlagValues) -> Array2<f64> {
    Zip::from(stack.lanes(Axis(0))).map_collect(|lane| {
        if lane.iter().all(|v| flags.is_landlike(*v)) {
            return flags.land;
        }
        let mut values: Vec<f64> = lane
            .iter()
            .map(|v| if *v > ice { 0.0 } else { *v })
            .collect();
        if median(&mut values) >= 0.5 { ice } else { ocean }
    })
}

/// Cells equal to `value` in any layer
pub fn any_layer_equals(stack: ArrayView3<f64>, value: f64) -> Array2<bool> {
    Zip::from(stack.lanes(Axis(0))).map_collect(|lane| lane.iter().any(|v| *v == value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    const MISSING: f64 = 255.0;
    const LAND: f64 = 254.0;
    const POLE: f64 = 251.0;

    fn valid() -> ValidRange {
        ValidRange::new(0.0, 100.0)
    }

    fn flags() -> FlagValues {
        FlagValues {
            pole: POLE,
            unused: 252.0,
            coast: 253.0,
            land: LAND,
            missing: MISSING,
        }
    }

    #[test]
    fn test_depth_one_reduction_is_identity() {
        let grid = array![[10.0, LAND], [MISSING, POLE]];
        let stack = grid.clone().insert_axis(Axis(0));
        assert_eq!(mean_or_flag(stack.view(), valid(), MISSING), grid);
    }

    #[test]
    fn test_data_wins_over_flags() {
        let values = [20.0, POLE, 40.0, MISSING];
        assert_eq!(
            resolve_cell(values, valid(), MISSING),
            CellResolution::Data(30.0)
        );
    }

    #[test]
    fn test_agreeing_flags_ignore_missing() {
        assert_eq!(
            resolve_cell([LAND, MISSING, LAND], valid(), MISSING),
            CellResolution::Flag(LAND)
        );
        assert_eq!(
            resolve_cell([MISSING, MISSING], valid(), MISSING),
            CellResolution::Missing
        );
        assert_eq!(
            resolve_cell([LAND, POLE], valid(), MISSING),
            CellResolution::Conflict
        );
    }

    #[test]
    fn test_entirely_missing_layer_does_not_mask_agreement() {
        let stack = Array3::from_shape_vec(
            (3, 1, 2),
            vec![POLE, 50.0, MISSING, MISSING, POLE, 70.0],
        )
        .unwrap();
        let reduced = mean_or_flag(stack.view(), valid(), MISSING);
        assert_eq!(reduced, array![[POLE, 60.0]]);
    }

    #[test]
    fn test_fill_missing_preserves_target_values() {
        let target = array![[10.0, MISSING, LAND, MISSING]];
        let others = Array3::from_shape_vec(
            (2, 1, 4),
            vec![
                90.0, 20.0, 30.0, LAND, //
                90.0, 40.0, 30.0, LAND,
            ],
        )
        .unwrap();
        let filled = fill_missing(target.view(), others.view(), valid(), MISSING);
        assert_eq!(filled, array![[10.0, 30.0, LAND, LAND]]);
    }

    #[test]
    fn test_standard_deviation_excludes_flags() {
        let stack = Array3::from_shape_vec(
            (3, 1, 2),
            vec![10.0, LAND, 20.0, LAND, LAND, LAND],
        )
        .unwrap();
        let std = standard_deviation(stack.view(), valid());
        assert!((std[[0, 0]] - 5.0).abs() < 1e-12);
        assert_eq!(std[[0, 1]], 0.0);
    }

    #[test]
    fn test_extent_median_rules() {
        let stack = Array3::from_shape_vec(
            (3, 1, 4),
            vec![
                0.0, 1.0, LAND, POLE, //
                0.0, 1.0, MISSING, 1.0, //
                1.0, 0.0, 253.0, MISSING,
            ],
        )
        .unwrap();
        let median = extent_median(stack.view(), 1.0, 0.0, &flags());
        assert_eq!(median, array![[0.0, 1.0, LAND, 0.0]]);
    }

    #[test]
    fn test_any_layer_equals() {
        let stack = Array3::from_shape_vec((2, 1, 2), vec![POLE, 10.0, 20.0, 10.0]).unwrap();
        assert_eq!(any_layer_equals(stack.view(), POLE), array![[true, false]]);
    }
}
