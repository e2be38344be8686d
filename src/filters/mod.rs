//! Ordered, pure transformations over gridsets.
//!
//! Filters are a closed set of kinds. A [`FilterPipeline`] can only be
//! built from [`FilterOptions`], which fixes the order in which the kinds
//! run:
//!
//! ```text
//! DropLand → DropBadDates → Interpolate → DropInvalidIce → LargestPoleHole
//!          → ConcentrationCutoff → ConcentrationToExtent → RequireFullMonth
//!          → ForbidEmpty
//! ```
//!
//! Bad layers are therefore always gone before interpolation, masks are
//! applied before thresholding, and the emptiness check sees the final
//! result.

pub mod operations;

#[cfg(test)]
pub mod tests;

use crate::error::Result;
use crate::gridset::Gridset;
use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::BTreeSet;
use tracing::debug;

pub use operations::{
    concentration_cutoff, concentration_to_extent, drop_bad_dates, drop_invalid_ice, drop_land,
    forbid_empty, interpolate, largest_pole_hole, require_full_month,
};

/// One transformation step
#[derive(Debug, Clone, PartialEq)]
pub enum GridsetFilter {
    /// Land and coast become zero concentration
    DropLand,
    /// Remove layers whose day is listed
    DropBadDates(BTreeSet<NaiveDate>),
    /// Fill the target day's missing cells from its neighbors
    Interpolate,
    /// Zero concentration inside the mask
    DropInvalidIce(Array2<bool>),
    /// Pole hole of any layer is applied to every layer
    LargestPoleHole,
    /// Concentration below the cutoff becomes zero
    ConcentrationCutoff(f64),
    /// Concentration at or above the threshold becomes extent
    ConcentrationToExtent(f64),
    RequireFullMonth,
    ForbidEmpty,
}

impl GridsetFilter {
    pub fn name(&self) -> &'static str {
        match self {
            GridsetFilter::DropLand => "drop_land",
            GridsetFilter::DropBadDates(_) => "drop_bad_dates",
            GridsetFilter::Interpolate => "interpolate",
            GridsetFilter::DropInvalidIce(_) => "drop_invalid_ice",
            GridsetFilter::LargestPoleHole => "largest_pole_hole",
            GridsetFilter::ConcentrationCutoff(_) => "concentration_cutoff",
            GridsetFilter::ConcentrationToExtent(_) => "concentration_to_extent",
            GridsetFilter::RequireFullMonth => "require_full_month",
            GridsetFilter::ForbidEmpty => "forbid_empty",
        }
    }

    pub fn apply(&self, gridset: &Gridset) -> Result<Gridset> {
        match self {
            GridsetFilter::DropLand => Ok(drop_land(gridset)),
            GridsetFilter::DropBadDates(dates) => drop_bad_dates(gridset, dates),
            GridsetFilter::Interpolate => interpolate(gridset),
            GridsetFilter::DropInvalidIce(mask) => drop_invalid_ice(gridset, mask),
            GridsetFilter::LargestPoleHole => Ok(largest_pole_hole(gridset)),
            GridsetFilter::ConcentrationCutoff(cutoff) => Ok(concentration_cutoff(gridset, *cutoff)),
            GridsetFilter::ConcentrationToExtent(threshold) => {
                Ok(concentration_to_extent(gridset, *threshold))
            }
            GridsetFilter::RequireFullMonth => require_full_month(gridset),
            GridsetFilter::ForbidEmpty => forbid_empty(gridset),
        }
    }
}

/// Which filters a request wants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub drop_land: bool,
    pub bad_dates: Option<BTreeSet<NaiveDate>>,
    pub interpolate: bool,
    pub invalid_ice_mask: Option<Array2<bool>>,
    pub largest_pole_hole: bool,
    pub concentration_cutoff: Option<f64>,
    pub extent_threshold: Option<f64>,
    pub require_full_month: bool,
    pub forbid_empty: bool,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drop_land(mut self, drop_land: bool) -> Self {
        self.drop_land = drop_land;
        self
    }

    pub fn with_bad_dates(mut self, dates: BTreeSet<NaiveDate>) -> Self {
        self.bad_dates = Some(dates);
        self
    }

    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn with_invalid_ice_mask(mut self, mask: Option<Array2<bool>>) -> Self {
        self.invalid_ice_mask = mask;
        self
    }

    pub fn with_largest_pole_hole(mut self, enabled: bool) -> Self {
        self.largest_pole_hole = enabled;
        self
    }

    pub fn with_concentration_cutoff(mut self, cutoff: f64) -> Self {
        self.concentration_cutoff = Some(cutoff);
        self
    }

    pub fn with_extent_threshold(mut self, threshold: f64) -> Self {
        self.extent_threshold = Some(threshold);
        self
    }

    pub fn with_require_full_month(mut self, require: bool) -> Self {
        self.require_full_month = require;
        self
    }

    pub fn with_forbid_empty(mut self, forbid: bool) -> Self {
        self.forbid_empty = forbid;
        self
    }
}

/// Filters in their fixed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPipeline {
    filters: Vec<GridsetFilter>,
}

impl FilterPipeline {
    /// The only way to assemble a pipeline
    pub fn from_options(options: FilterOptions) -> Self {
        let mut filters = Vec::new();

        if options.drop_land {
            filters.push(GridsetFilter::DropLand);
        }
        if let Some(dates) = options.bad_dates {
            filters.push(GridsetFilter::DropBadDates(dates));
        }
        if options.interpolate {
            filters.push(GridsetFilter::Interpolate);
        }
        if let Some(mask) = options.invalid_ice_mask {
            filters.push(GridsetFilter::DropInvalidIce(mask));
        }
        if options.largest_pole_hole {
            filters.push(GridsetFilter::LargestPoleHole);
        }
        if let Some(cutoff) = options.concentration_cutoff {
            filters.push(GridsetFilter::ConcentrationCutoff(cutoff));
        }
        if let Some(threshold) = options.extent_threshold {
            filters.push(GridsetFilter::ConcentrationToExtent(threshold));
        }
        if options.require_full_month {
            filters.push(GridsetFilter::RequireFullMonth);
        }
        if options.forbid_empty {
            filters.push(GridsetFilter::ForbidEmpty);
        }

        Self { filters }
    }

    pub fn filters(&self) -> &[GridsetFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter left to right; the input is never modified
    pub fn apply(&self, gridset: &Gridset) -> Result<Gridset> {
        let mut current = gridset.clone();
        for filter in &self.filters {
            debug!(
                "Applying {} to {} {:?} gridset ({} layers)",
                filter.name(),
                current.metadata.hemisphere,
                current.metadata.temporality,
                current.data.depth()
            );
            current = filter.apply(&current)?;
        }
        Ok(current)
    }
}
