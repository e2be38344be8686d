//! Weighted least squares with an F-test on the slope.

use crate::error::{Result, SeaIceError};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Fitted line and the significance of its slope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub p_value: f64,
}

/// Limits applied when turning one cell's series into a trend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSettings {
    /// Trends are clamped to plus or minus this value
    pub clipping_threshold: f64,
    pub min_points: usize,
    pub max_p_value: f64,
}

/// Fit `y = intercept + slope * x` to `(x, y, weight)` points.
///
/// The p-value comes from the F statistic of the model against the
/// intercept-only model with (1, n - 2) degrees of freedom. A perfect fit
/// has p = 0; a fit explaining nothing has p = 1.
pub fn weighted_least_squares(points: &[(f64, f64, f64)]) -> Result<TrendFit> {
    let n = points.len();
    if n < 3 {
        return Err(SeaIceError::Regression {
            message: format!("need at least 3 points, got {n}"),
        });
    }

    let total_weight: f64 = points.iter().map(|(_, _, w)| w).sum();
    if total_weight <= 0.0 || !total_weight.is_finite() {
        return Err(SeaIceError::Regression {
            message: format!("total weight {total_weight} is not positive"),
        });
    }

    let x_mean = points.iter().map(|(x, _, w)| w * x).sum::<f64>() / total_weight;
    let y_mean = points.iter().map(|(_, y, w)| w * y).sum::<f64>() / total_weight;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y, w)| {
        let dx = x - x_mean;
        (sxx + w * dx * dx, sxy + w * dx * (y - y_mean))
    });
    if sxx <= 0.0 {
        return Err(SeaIceError::Regression {
            message: "x values do not vary".to_string(),
        });
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let (residual_ss, total_ss) = points.iter().fold((0.0, 0.0), |(rss, tss), (x, y, w)| {
        let residual = y - (intercept + slope * x);
        (rss + w * residual * residual, tss + w * (y - y_mean).powi(2))
    });
    let explained_ss = (total_ss - residual_ss).max(0.0);
    let residual_df = (n - 2) as f64;

    let p_value = if explained_ss <= f64::EPSILON * total_ss.max(1.0) {
        1.0
    } else if residual_ss <= 0.0 {
        0.0
    } else {
        let f_statistic = explained_ss / (residual_ss / residual_df);
        let distribution = FisherSnedecor::new(1.0, residual_df).map_err(|e| {
            SeaIceError::Regression {
                message: e.to_string(),
            }
        })?;
        distribution.sf(f_statistic)
    };

    Ok(TrendFit {
        slope,
        intercept,
        p_value,
    })
}

/// Decadal trend for one cell.
///
/// `series` holds one concentration per year and `weights` the matching
/// weights; x is the year's position in the full series. Years with zero
/// weight or a NaN value are left out. Too few remaining years, a failed
/// fit or an insignificant slope all give 0.
pub fn trend_for_cell(series: &[f64], weights: &[f64], settings: &TrendSettings) -> f64 {
    let points: Vec<(f64, f64, f64)> = series
        .iter()
        .zip(weights)
        .enumerate()
        .filter(|(_, (y, w))| **w > 0.0 && w.is_finite() && y.is_finite())
        .map(|(index, (y, w))| (index as f64, *y, *w))
        .collect();

    if points.len() < settings.min_points.max(3) {
        return 0.0;
    }

    match weighted_least_squares(&points) {
        Ok(fit) if fit.p_value <= settings.max_p_value => {
            let limit = settings.clipping_threshold.abs();
            (fit.slope * 10.0).clamp(-limit, limit)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(clip: f64) -> TrendSettings {
        TrendSettings {
            clipping_threshold: clip,
            min_points: 3,
            max_p_value: 0.05,
        }
    }

    #[test]
    fn test_exact_line_is_recovered() {
        let points: Vec<_> = (0..5).map(|x| (x as f64, 2.0 + 0.5 * x as f64, 1.0)).collect();
        let fit = weighted_least_squares(&points).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.intercept - 2.0).abs() < 1e-12);
        assert!(fit.p_value < 1e-12);
    }

    #[test]
    fn test_noisy_significant_slope_has_small_p() {
        let ys = [1.0, 2.2, 2.9, 4.1, 5.0, 5.8, 7.2, 8.0];
        let points: Vec<_> = ys.iter().enumerate().map(|(x, y)| (x as f64, *y, 1.0)).collect();
        let fit = weighted_least_squares(&points).unwrap();
        assert!(fit.p_value < 0.001);
        assert!((fit.slope - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_flat_series_is_not_significant() {
        let points: Vec<_> = (0..4).map(|x| (x as f64, 7.0, 1.0)).collect();
        let fit = weighted_least_squares(&points).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.p_value, 1.0);
    }

    #[test]
    fn test_weights_pull_the_fit() {
        let points = [
            (0.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (2.0, 2.0, 1.0),
            (3.0, 100.0, 1e-12),
        ];
        let fit = weighted_least_squares(&points).unwrap();
        assert!((fit.slope - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_linear_cell_trend_is_slope_times_ten() {
        let series = [10.0, 11.0, 12.0, 13.0];
        let trend = trend_for_cell(&series, &[1.0; 4], &settings(100.0));
        assert!((trend - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_weighted_years_give_zero() {
        let series = [10.0, 11.0, 12.0, 13.0];
        let trend = trend_for_cell(&series, &[1.0, 0.0, 1.0, 0.0], &settings(100.0));
        assert_eq!(trend, 0.0);

        let with_nan = [10.0, f64::NAN, 12.0, 13.0];
        assert_eq!(trend_for_cell(&with_nan, &[1.0, 1.0, 0.0, 1.0], &settings(100.0)), 0.0);
    }

    #[test]
    fn test_trend_is_clamped_to_threshold() {
        let rising = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(trend_for_cell(&rising, &[1.0; 4], &settings(50.0)), 50.0);

        let falling = [30.0, 20.0, 10.0, 0.0];
        assert_eq!(trend_for_cell(&falling, &[1.0; 4], &settings(50.0)), -50.0);
    }

    #[test]
    fn test_insignificant_trend_is_zero() {
        let series = [10.0, 30.0, 5.0, 25.0, 12.0];
        assert_eq!(trend_for_cell(&series, &[1.0; 5], &settings(100.0)), 0.0);
    }
}
