//! Inputs supplied by collaborators outside this crate.
//!
//! Invalid-ice masks and bad-date lists come from other systems; these
//! traits are the seams through which they are injected, with in-memory
//! implementations for callers that already hold the data.

use crate::calendar::{date_for_day_of_year, most_common_month};
use crate::error::Result;
use crate::models::Hemisphere;
use chrono::NaiveDate;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Per-hemisphere, per-month masks of climatologically impossible ice
pub trait InvalidIceMaskSource {
    /// `None` when no mask is known, in which case masking is skipped
    fn invalid_ice_mask(&self, hemisphere: Hemisphere, month: u32) -> Result<Option<Array2<bool>>>;
}

/// Days whose source data is known to be unusable
pub trait BadDateSource {
    fn bad_dates(&self, hemisphere: Hemisphere) -> Result<BTreeSet<NaiveDate>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryInvalidIceMasks {
    masks: HashMap<(Hemisphere, u32), Array2<bool>>,
}

impl InMemoryInvalidIceMasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask(mut self, hemisphere: Hemisphere, month: u32, mask: Array2<bool>) -> Self {
        self.masks.insert((hemisphere, month), mask);
        self
    }
}

impl InvalidIceMaskSource for InMemoryInvalidIceMasks {
    fn invalid_ice_mask(&self, hemisphere: Hemisphere, month: u32) -> Result<Option<Array2<bool>>> {
        Ok(self.masks.get(&(hemisphere, month)).cloned())
    }
}

/// Bad dates keyed by hemisphere, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BadDateList {
    pub north: BTreeSet<NaiveDate>,
    pub south: BTreeSet<NaiveDate>,
}

impl BadDateList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, hemisphere: Hemisphere, date: NaiveDate) -> Self {
        match hemisphere {
            Hemisphere::North => self.north.insert(date),
            Hemisphere::South => self.south.insert(date),
        };
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl BadDateSource for BadDateList {
    fn bad_dates(&self, hemisphere: Hemisphere) -> Result<BTreeSet<NaiveDate>> {
        Ok(match hemisphere {
            Hemisphere::North => self.north.clone(),
            Hemisphere::South => self.south.clone(),
        })
    }
}

/// Cells invalid in every month of a season
pub fn seasonal_invalid_ice_mask(
    source: &dyn InvalidIceMaskSource,
    hemisphere: Hemisphere,
    months: &[u32],
) -> Result<Option<Array2<bool>>> {
    let mut combined: Option<Array2<bool>> = None;
    for month in months {
        let Some(mask) = source.invalid_ice_mask(hemisphere, *month)? else {
            return Ok(None);
        };
        combined = Some(match combined {
            None => mask,
            Some(acc) => Zip::from(&acc).and(&mask).map_collect(|a, b| *a && *b),
        });
    }
    Ok(combined)
}

/// Mask for the month a day-of-year most often falls in across the years
pub fn day_of_year_invalid_ice_mask(
    source: &dyn InvalidIceMaskSource,
    hemisphere: Hemisphere,
    start_year: i32,
    end_year: i32,
    day_of_year: u32,
) -> Result<Option<Array2<bool>>> {
    let dates = (start_year..=end_year)
        .map(|year| date_for_day_of_year(year, day_of_year))
        .collect::<Result<Vec<_>>>()?;
    match most_common_month(&dates) {
        Some(month) => source.invalid_ice_mask(hemisphere, month),
        None => Ok(None),
    }
}
