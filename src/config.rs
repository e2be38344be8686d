//! Configuration management and validation.
//!
//! Provides the configuration threaded into every component: per-hemisphere
//! grid geometry and flag tables, calendar boundaries, platform preference
//! rules, search roots and processing thresholds. Defaults reproduce the
//! NASA Team archive conventions; JSON files can override any subset.

use crate::calendar::date_from_triple;
use crate::constants::{self, flags};
use crate::error::{Result, SeaIceError};
use crate::models::{FlagValues, Hemisphere, ValidRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Grid geometry and value encoding for one hemisphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// (rows, cols)
    pub shape: (usize, usize),

    /// Flag sentinel codes, stored unscaled
    pub flags: FlagValues,

    /// Raw code range holding scaled concentration
    pub raw_valid_range: ValidRange,

    /// Divisor applied to raw codes inside `raw_valid_range`
    pub scale: f64,
}

impl GridSpec {
    pub fn with_shape(shape: (usize, usize)) -> Self {
        Self {
            shape,
            flags: FlagValues {
                pole: flags::POLE,
                unused: flags::UNUSED,
                coast: flags::COAST,
                land: flags::LAND,
                missing: flags::MISSING,
            },
            raw_valid_range: ValidRange::new(
                constants::RAW_VALID_DATA_RANGE.0,
                constants::RAW_VALID_DATA_RANGE.1,
            ),
            scale: constants::SCALE,
        }
    }

    /// Valid range after scaling, i.e. percent concentration
    pub fn valid_range(&self) -> ValidRange {
        ValidRange::new(
            self.raw_valid_range.min / self.scale,
            self.raw_valid_range.max / self.scale,
        )
    }

    pub fn cell_count(&self) -> usize {
        self.shape.0 * self.shape.1
    }
}

/// Date range over which a platform is the preferred source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRange {
    pub platform: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PlatformRange {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A month whose concentration is known to be unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadConcentrationMonth {
    pub year: i32,
    pub month: u32,
    pub hemisphere: Hemisphere,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonDefinition {
    pub name: String,
    pub months: Vec<u32>,
}

/// Ordered set of filesystem roots to scan for source files.
///
/// Deserializing a bare string is rejected rather than treated as a
/// one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<PathBuf>", try_from = "SearchPathsRepr")]
pub struct SearchPaths(Vec<PathBuf>);

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchPathsRepr {
    Bare(String),
    Many(Vec<PathBuf>),
}

impl TryFrom<SearchPathsRepr> for SearchPaths {
    type Error = SeaIceError;

    fn try_from(repr: SearchPathsRepr) -> Result<Self> {
        match repr {
            SearchPathsRepr::Bare(path) => Err(SeaIceError::InvalidSearchPaths {
                message: format!("expected a list of roots, found bare string {path:?}"),
            }),
            SearchPathsRepr::Many(roots) => Ok(SearchPaths(roots)),
        }
    }
}

impl From<SearchPaths> for Vec<PathBuf> {
    fn from(paths: SearchPaths) -> Self {
        paths.0
    }
}

impl SearchPaths {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SearchPaths(roots.into_iter().map(Into::into).collect())
    }

    /// Validate an untyped JSON value before it becomes a search root list
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Array(_) => Ok(SearchPaths(serde_json::from_value(value.clone())?)),
            other => Err(SeaIceError::InvalidSearchPaths {
                message: format!("expected a list of roots, found {other}"),
            }),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenation preserving order and dropping repeated roots
    pub fn merged(&self, other: &SearchPaths) -> SearchPaths {
        let mut roots = self.0.clone();
        for root in &other.0 {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }
        SearchPaths(roots)
    }
}

/// Main configuration for gridset retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaIceConfig {
    pub north: GridSpec,
    pub south: GridSpec,

    /// First day with daily coverage
    pub satellite_era_start: NaiveDate,

    /// First day of the first complete month
    pub satellite_era_start_monthly: NaiveDate,

    /// Final files are authoritative on or before this date
    pub last_day_with_valid_final_data: NaiveDate,

    /// Day of month representing a monthly file during platform arbitration
    pub monthly_platform_reference_day: u32,

    pub platform_preferences: Vec<PlatformRange>,

    /// Platform code whose files are counted twice in averages
    pub smmr_platform: String,

    pub min_days_for_valid_month: usize,

    /// Concentration at or above which a cell counts as ice extent
    pub extent_threshold: f64,

    pub final_search_paths: SearchPaths,
    pub nrt_search_paths: SearchPaths,

    /// Directory listings kept by the locator cache
    pub listing_cache_capacity: usize,

    /// Worker threads for per-cell trend regression
    pub workers: usize,

    pub bad_concentration_months: Vec<BadConcentrationMonth>,
    pub seasons: Vec<SeasonDefinition>,

    pub max_f_test_p_value: f64,
    pub min_trend_points: usize,
}

fn fixed_date(triple: (i32, u32, u32)) -> NaiveDate {
    date_from_triple(triple).unwrap_or(NaiveDate::MIN)
}

impl Default for SeaIceConfig {
    fn default() -> Self {
        let platform_preferences = constants::PLATFORM_RANGES
            .iter()
            .map(|(platform, start, end)| PlatformRange {
                platform: (*platform).to_string(),
                start: fixed_date(*start),
                end: fixed_date(*end),
            })
            .collect();

        let seasons = constants::SEASONS
            .iter()
            .map(|(name, months)| SeasonDefinition {
                name: (*name).to_string(),
                months: months.to_vec(),
            })
            .collect();

        Self {
            north: GridSpec::with_shape(constants::NORTH_SHAPE),
            south: GridSpec::with_shape(constants::SOUTH_SHAPE),
            satellite_era_start: fixed_date(constants::BEGINNING_OF_SATELLITE_ERA),
            satellite_era_start_monthly: fixed_date(constants::BEGINNING_OF_SATELLITE_ERA_MONTHLY),
            last_day_with_valid_final_data: fixed_date(constants::LAST_DAY_WITH_VALID_FINAL_DATA),
            monthly_platform_reference_day: constants::MONTHLY_PLATFORM_REFERENCE_DAY,
            platform_preferences,
            smmr_platform: constants::SMMR_PLATFORM.to_string(),
            min_days_for_valid_month: constants::MINIMUM_DAYS_FOR_VALID_MONTH,
            extent_threshold: constants::EXTENT_THRESHOLD,
            final_search_paths: SearchPaths::new(constants::DEFAULT_FINAL_SEA_ICE_PATHS.iter().copied()),
            nrt_search_paths: SearchPaths::new(constants::DEFAULT_NRT_SEA_ICE_PATHS.iter().copied()),
            listing_cache_capacity: constants::DEFAULT_LISTING_CACHE_CAPACITY,
            workers: num_cpus::get(),
            bad_concentration_months: vec![BadConcentrationMonth {
                year: 1987,
                month: 8,
                hemisphere: Hemisphere::North,
            }],
            seasons,
            max_f_test_p_value: constants::MAXIMUM_F_TEST_P_VALUE,
            min_trend_points: constants::MINIMUM_TREND_POINTS,
        }
    }
}

impl SeaIceConfig {
    /// Load overrides from a JSON document on top of the defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        for key in ["final_search_paths", "nrt_search_paths"] {
            if let Some(paths) = value.get(key) {
                SearchPaths::from_json_value(paths)?;
            }
        }
        let config: SeaIceConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Defaults, overridden by the file named in `SEAICE_CONFIG` when set
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(constants::CONFIG_ENV_VAR) {
            Some(path) => Self::from_json_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Reject settings that would make later computation meaningless
    pub fn validate(&self) -> Result<()> {
        for spec in [&self.north, &self.south] {
            if spec.scale <= 0.0 {
                return Err(SeaIceError::Configuration {
                    message: format!("scale must be positive, found {}", spec.scale),
                });
            }
        }
        if self.workers == 0 {
            return Err(SeaIceError::Configuration {
                message: "workers must be at least 1".to_string(),
            });
        }
        if self.listing_cache_capacity == 0 {
            return Err(SeaIceError::Configuration {
                message: "listing_cache_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_grid_spec(mut self, hemisphere: Hemisphere, spec: GridSpec) -> Self {
        match hemisphere {
            Hemisphere::North => self.north = spec,
            Hemisphere::South => self.south = spec,
        }
        self
    }

    /// Use the same grid shape for both hemispheres
    pub fn with_shape(mut self, shape: (usize, usize)) -> Self {
        self.north.shape = shape;
        self.south.shape = shape;
        self
    }

    pub fn with_search_paths(mut self, final_paths: SearchPaths, nrt_paths: SearchPaths) -> Self {
        self.final_search_paths = final_paths;
        self.nrt_search_paths = nrt_paths;
        self
    }

    pub fn with_min_days_for_valid_month(mut self, min_days: usize) -> Self {
        self.min_days_for_valid_month = min_days;
        self
    }

    pub fn with_extent_threshold(mut self, threshold: f64) -> Self {
        self.extent_threshold = threshold;
        self
    }

    pub fn with_last_day_with_valid_final_data(mut self, date: NaiveDate) -> Self {
        self.last_day_with_valid_final_data = date;
        self
    }

    pub fn with_platform_preferences(mut self, preferences: Vec<PlatformRange>) -> Self {
        self.platform_preferences = preferences;
        self
    }

    pub fn with_listing_cache_capacity(mut self, capacity: usize) -> Self {
        self.listing_cache_capacity = capacity;
        self
    }

    pub fn with_bad_concentration_months(mut self, months: Vec<BadConcentrationMonth>) -> Self {
        self.bad_concentration_months = months;
        self
    }

    pub fn grid_spec(&self, hemisphere: Hemisphere) -> &GridSpec {
        match hemisphere {
            Hemisphere::North => &self.north,
            Hemisphere::South => &self.south,
        }
    }

    /// Final roots followed by NRT roots
    pub fn default_search_paths(&self) -> SearchPaths {
        self.final_search_paths.merged(&self.nrt_search_paths)
    }

    pub fn is_smmr(&self, platform: &str) -> bool {
        platform == self.smmr_platform
    }

    pub fn is_preferred_platform(&self, platform: &str, date: NaiveDate) -> bool {
        self.platform_preferences
            .iter()
            .any(|range| range.platform == platform && range.covers(date))
    }

    pub fn is_bad_concentration_month(&self, hemisphere: Hemisphere, year: i32, month: u32) -> bool {
        self.bad_concentration_months
            .iter()
            .any(|bad| bad.hemisphere == hemisphere && bad.year == year && bad.month == month)
    }

    /// Months of a named season, checked to be three consecutive months
    pub fn season_months(&self, name: &str) -> Result<[u32; 3]> {
        let season = self
            .seasons
            .iter()
            .find(|season| season.name == name)
            .ok_or_else(|| SeaIceError::BadSeason {
                message: format!("unknown season {name:?}"),
            })?;
        validate_season(&season.months)
    }
}

/// Accept exactly three consecutive months, wrapping December to January
pub fn validate_season(months: &[u32]) -> Result<[u32; 3]> {
    let bad = || SeaIceError::BadSeason {
        message: format!("{months:?} is not three consecutive months"),
    };
    let [first, second, third] = <[u32; 3]>::try_from(months).map_err(|_| bad())?;
    let next = |m: u32| if m == 12 { 1 } else { m + 1 };
    if !(1..=12).contains(&first) || second != next(first) || third != next(second) {
        return Err(bad());
    }
    Ok([first, second, third])
}
