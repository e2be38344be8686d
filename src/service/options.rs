//! Per-request options with the defaults each request kind uses.

use crate::config::SearchPaths;

/// Options for single-day requests
#[derive(Debug, Clone, PartialEq)]
pub struct DailyOptions {
    /// Days either side of the target used to fill its missing cells
    pub interpolation_radius: u32,
    /// Return the empty gridset instead of failing with no data
    pub allow_empty_gridset: bool,
    pub allow_bad_dates: bool,
    pub drop_land: bool,
    pub drop_invalid_ice: bool,
    /// Overrides the service's search paths
    pub search_paths: Option<SearchPaths>,
}

impl Default for DailyOptions {
    fn default() -> Self {
        Self {
            interpolation_radius: 0,
            allow_empty_gridset: true,
            allow_bad_dates: true,
            drop_land: false,
            drop_invalid_ice: false,
            search_paths: None,
        }
    }
}

impl DailyOptions {
    /// Defaults for extent requests, which drop invalid ice
    pub fn for_extent() -> Self {
        Self {
            drop_invalid_ice: true,
            ..Self::default()
        }
    }

    pub fn with_interpolation_radius(mut self, radius: u32) -> Self {
        self.interpolation_radius = radius;
        self
    }

    pub fn with_allow_empty_gridset(mut self, allow: bool) -> Self {
        self.allow_empty_gridset = allow;
        self
    }

    pub fn with_allow_bad_dates(mut self, allow: bool) -> Self {
        self.allow_bad_dates = allow;
        self
    }

    pub fn with_drop_land(mut self, drop_land: bool) -> Self {
        self.drop_land = drop_land;
        self
    }

    pub fn with_drop_invalid_ice(mut self, drop: bool) -> Self {
        self.drop_invalid_ice = drop;
        self
    }

    pub fn with_search_paths(mut self, search_paths: SearchPaths) -> Self {
        self.search_paths = Some(search_paths);
        self
    }
}

/// Options for monthly and seasonal requests
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyOptions {
    pub allow_empty_gridset: bool,
    pub drop_land: bool,
    pub drop_invalid_ice: bool,
    /// Fail when a month built from daily files misses a calendar day
    pub require_full_month: bool,
    /// Overrides the configured minimum
    pub min_days_for_valid_month: Option<usize>,
    pub search_paths: Option<SearchPaths>,
}

impl Default for MonthlyOptions {
    fn default() -> Self {
        Self {
            allow_empty_gridset: true,
            drop_land: false,
            drop_invalid_ice: false,
            require_full_month: false,
            min_days_for_valid_month: None,
            search_paths: None,
        }
    }
}

impl MonthlyOptions {
    /// Defaults for extent requests, which drop invalid ice
    pub fn for_extent() -> Self {
        Self {
            drop_invalid_ice: true,
            ..Self::default()
        }
    }

    pub fn with_allow_empty_gridset(mut self, allow: bool) -> Self {
        self.allow_empty_gridset = allow;
        self
    }

    pub fn with_drop_land(mut self, drop_land: bool) -> Self {
        self.drop_land = drop_land;
        self
    }

    pub fn with_drop_invalid_ice(mut self, drop: bool) -> Self {
        self.drop_invalid_ice = drop;
        self
    }

    pub fn with_require_full_month(mut self, require: bool) -> Self {
        self.require_full_month = require;
        self
    }

    pub fn with_min_days_for_valid_month(mut self, min_days: usize) -> Self {
        self.min_days_for_valid_month = Some(min_days);
        self
    }

    pub fn with_search_paths(mut self, search_paths: SearchPaths) -> Self {
        self.search_paths = Some(search_paths);
        self
    }
}

/// Options for averages over a date range
#[derive(Debug, Clone, PartialEq)]
pub struct AverageOptions {
    pub allow_empty_gridset: bool,
    pub drop_land: bool,
    pub drop_invalid_ice: bool,
    pub search_paths: Option<SearchPaths>,
}

impl Default for AverageOptions {
    fn default() -> Self {
        Self {
            allow_empty_gridset: true,
            drop_land: false,
            drop_invalid_ice: true,
            search_paths: None,
        }
    }
}

/// Options for day-of-year extent medians
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMedianOptions {
    pub interpolation_radius: u32,
    pub allow_empty_gridset: bool,
    pub allow_bad_dates: bool,
    pub drop_land: bool,
    pub drop_invalid_ice: bool,
    /// `None` uses the configured threshold
    pub extent_threshold: Option<f64>,
    pub search_paths: Option<SearchPaths>,
}

impl Default for DailyMedianOptions {
    fn default() -> Self {
        Self {
            interpolation_radius: 1,
            allow_empty_gridset: true,
            allow_bad_dates: false,
            drop_land: false,
            drop_invalid_ice: false,
            extent_threshold: None,
            search_paths: None,
        }
    }
}
