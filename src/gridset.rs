//! The gridset: one grid or a stack of grids plus provenance metadata.
//!
//! Gridsets are built by the builder and transformed by filters; every
//! transformation produces a new value and leaves its input untouched.

use crate::config::GridSpec;
use crate::error::{Result, SeaIceError};
use crate::models::{FlagValues, Hemisphere, Period, Temporality, ValidRange};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use serde::Serialize;
use std::path::PathBuf;

/// Grid payload. Stack layers run along `Axis(0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum GridData {
    Grid(Array2<f64>),
    Stack(Array3<f64>),
}

impl GridData {
    /// Collapse a list of same-shape layers; one layer becomes a plain grid
    pub fn from_layers(layers: Vec<Array2<f64>>) -> Result<Self> {
        match layers.len() {
            0 => Err(SeaIceError::NoData),
            1 => Ok(GridData::Grid(layers.into_iter().next().ok_or(SeaIceError::NoData)?)),
            _ => {
                let expected = layers[0].dim();
                if let Some(bad) = layers.iter().find(|layer| layer.dim() != expected) {
                    return Err(SeaIceError::ShapeMismatch {
                        expected,
                        found: bad.dim(),
                    });
                }
                let views: Vec<ArrayView2<f64>> = layers.iter().map(|layer| layer.view()).collect();
                Ok(GridData::Stack(ndarray::stack(Axis(0), &views)?))
            }
        }
    }

    /// (rows, cols) of each layer
    pub fn grid_shape(&self) -> (usize, usize) {
        match self {
            GridData::Grid(grid) => grid.dim(),
            GridData::Stack(stack) => {
                let (_, rows, cols) = stack.dim();
                (rows, cols)
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            GridData::Grid(_) => 1,
            GridData::Stack(stack) => stack.len_of(Axis(0)),
        }
    }

    pub fn is_stack(&self) -> bool {
        matches!(self, GridData::Stack(_))
    }

    pub fn layer(&self, index: usize) -> Option<ArrayView2<'_, f64>> {
        match self {
            GridData::Grid(grid) if index == 0 => Some(grid.view()),
            GridData::Grid(_) => None,
            GridData::Stack(stack) if index < stack.len_of(Axis(0)) => {
                Some(stack.index_axis(Axis(0), index))
            }
            GridData::Stack(_) => None,
        }
    }

    pub fn layers(&self) -> Vec<ArrayView2<'_, f64>> {
        (0..self.depth()).filter_map(|i| self.layer(i)).collect()
    }

    /// View as a stack; a plain grid becomes a depth-1 stack
    pub fn as_stack(&self) -> ArrayView3<'_, f64> {
        match self {
            GridData::Grid(grid) => grid.view().insert_axis(Axis(0)),
            GridData::Stack(stack) => stack.view(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GridData::Grid(grid) => grid.len(),
            GridData::Stack(stack) => stack.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_equal(&self, value: f64) -> bool {
        match self {
            GridData::Grid(grid) => grid.iter().all(|v| *v == value),
            GridData::Stack(stack) => stack.iter().all(|v| *v == value),
        }
    }

    pub fn any_equal(&self, value: f64) -> bool {
        match self {
            GridData::Grid(grid) => grid.iter().any(|v| *v == value),
            GridData::Stack(stack) => stack.iter().any(|v| *v == value),
        }
    }

    /// Element-wise map preserving the payload shape
    pub fn mapv(&self, f: impl Fn(f64) -> f64) -> GridData {
        match self {
            GridData::Grid(grid) => GridData::Grid(grid.mapv(f)),
            GridData::Stack(stack) => GridData::Stack(stack.mapv(f)),
        }
    }

    /// Keep only the layers at `indices`, in that order
    pub fn select_layers(&self, indices: &[usize]) -> Result<GridData> {
        let layers: Vec<Array2<f64>> = indices
            .iter()
            .filter_map(|i| self.layer(*i).map(|layer| layer.to_owned()))
            .collect();
        GridData::from_layers(layers)
    }
}

/// Files and periods behind one component of a derived product
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Provenance {
    pub files: Vec<PathBuf>,
    pub periods: Vec<Period>,
}

/// What a gridset's values measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Product {
    Concentration,
    Extent,
    MedianExtent,
    StandardDeviation,
    MonthlyAnomaly,
    MonthlyTrend,
    SeasonalTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Source files; duplicates stand for double-weighted layers
    pub files: Vec<PathBuf>,

    /// Calendar period of each file, in the same order
    pub periods: Vec<Period>,

    pub temporality: Temporality,

    /// Period the gridset was requested for
    pub period: Option<Period>,

    pub hemisphere: Hemisphere,
    pub valid_range: ValidRange,
    pub flags: FlagValues,
    pub missing_value: f64,

    /// Set when no source contributed data
    pub empty_gridset: bool,

    pub drop_land: bool,
    pub drop_invalid_ice: bool,
    pub product: Product,

    /// Years spanned by multi-year products
    pub years: Vec<i32>,
    pub day_of_year: Option<u32>,
    pub season: Option<(i32, [u32; 3])>,

    /// Per-year provenance for multi-year products
    pub layer_provenance: Vec<Provenance>,

    /// Climatology behind an anomaly
    pub climatology: Option<Provenance>,

    /// Daily grids behind trend weights
    pub variability: Option<Provenance>,
}

impl Metadata {
    pub fn new(hemisphere: Hemisphere, temporality: Temporality, spec: &GridSpec) -> Self {
        Self {
            files: Vec::new(),
            periods: Vec::new(),
            temporality,
            period: None,
            hemisphere,
            valid_range: spec.valid_range(),
            flags: spec.flags,
            missing_value: spec.flags.missing,
            empty_gridset: false,
            drop_land: false,
            drop_invalid_ice: false,
            product: Product::Concentration,
            years: Vec::new(),
            day_of_year: None,
            season: None,
            layer_provenance: Vec::new(),
            climatology: None,
            variability: None,
        }
    }

    pub fn provenance(&self) -> Provenance {
        Provenance {
            files: self.files.clone(),
            periods: self.periods.clone(),
        }
    }

    /// True if every period is a single day
    pub fn has_daily_periods(&self) -> bool {
        !self.periods.is_empty() && self.periods.iter().all(Period::is_daily)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gridset {
    pub data: GridData,
    pub metadata: Metadata,
}

impl Gridset {
    pub fn new(data: GridData, metadata: Metadata) -> Self {
        Self { data, metadata }
    }

    /// Uniformly missing grid standing in for absent sources
    pub fn empty(
        spec: &GridSpec,
        hemisphere: Hemisphere,
        temporality: Temporality,
        period: Option<Period>,
    ) -> Self {
        let mut metadata = Metadata::new(hemisphere, temporality, spec);
        metadata.empty_gridset = true;
        metadata.period = period;
        metadata.valid_range = ValidRange::new(0.0, 100.0);
        let grid = Array2::from_elem(spec.shape, metadata.missing_value);
        Self {
            data: GridData::Grid(grid),
            metadata,
        }
    }

    pub fn grid_shape(&self) -> (usize, usize) {
        self.data.grid_shape()
    }

    pub fn is_uniformly_missing(&self) -> bool {
        self.data.all_equal(self.metadata.missing_value)
    }

    /// Same metadata, new payload
    pub fn with_data(&self, data: GridData) -> Self {
        Self {
            data,
            metadata: self.metadata.clone(),
        }
    }
}
