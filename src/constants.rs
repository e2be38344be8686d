//! Application constants for sea ice gridset retrieval
//!
//! This module contains the default values used to seed [`crate::config::SeaIceConfig`].
//! Nothing outside the config reads these directly; every component receives
//! its values through the config it was constructed with.

// =============================================================================
// Grid Geometry
// =============================================================================

/// Northern hemisphere polar stereographic grid (rows, cols)
pub const NORTH_SHAPE: (usize, usize) = (448, 304);

/// Southern hemisphere polar stereographic grid (rows, cols)
pub const SOUTH_SHAPE: (usize, usize) = (332, 316);

// =============================================================================
// Source File Encoding
// =============================================================================

/// Length in bytes of the fixed header preceding the grid codes
pub const HEADER_LENGTH: usize = 300;

/// Byte offsets of the ASCII column and row counts within the header
pub const HEADER_COLS_FIELD: (usize, usize) = (6, 12);
pub const HEADER_ROWS_FIELD: (usize, usize) = (12, 18);

/// Raw codes in this inclusive range are scaled concentration
pub const RAW_VALID_DATA_RANGE: (f64, f64) = (0.0, 250.0);

/// Divisor converting raw codes into percent concentration
pub const SCALE: f64 = 2.5;

/// Flag sentinel codes shared by both hemispheres
pub mod flags {
    pub const POLE: f64 = 251.0;
    pub const UNUSED: f64 = 252.0;
    pub const COAST: f64 = 253.0;
    pub const LAND: f64 = 254.0;
    pub const MISSING: f64 = 255.0;
}

/// Filename pattern applied to directory entries before parsing
pub const FILENAME_GLOB_INFIX: &str = "nt_";
pub const FILENAME_EXTENSION: &str = "bin";

/// Version tag used by near-real-time files
pub const NRT_VERSION_TAG: &str = "nrt";

// =============================================================================
// Calendar Boundaries
// =============================================================================

/// First day of daily coverage (year, month, day)
pub const BEGINNING_OF_SATELLITE_ERA: (i32, u32, u32) = (1978, 10, 26);

/// First complete month of coverage (year, month, day)
pub const BEGINNING_OF_SATELLITE_ERA_MONTHLY: (i32, u32, u32) = (1978, 11, 1);

/// Last day for which final (non-NRT) files are authoritative
pub const LAST_DAY_WITH_VALID_FINAL_DATA: (i32, u32, u32) = (2018, 12, 31);

/// Day of month used to arbitrate platforms for monthly files
pub const MONTHLY_PLATFORM_REFERENCE_DAY: u32 = 15;

// =============================================================================
// Platforms
// =============================================================================

/// Legacy every-other-day sensor whose files are counted twice
pub const SMMR_PLATFORM: &str = "n07";

/// Preferred platform per date range, inclusive, following the V1.1 convention
pub const PLATFORM_RANGES: &[(&str, (i32, u32, u32), (i32, u32, u32))] = &[
    ("n07", (1978, 10, 25), (1987, 8, 20)),
    ("f08", (1987, 8, 21), (1991, 12, 18)),
    ("f11", (1991, 12, 19), (1995, 9, 29)),
    ("f13", (1995, 9, 30), (2007, 12, 31)),
    ("f17", (2008, 1, 1), (2018, 12, 31)),
    ("f18", (2019, 1, 1), (2250, 1, 1)),
];

// =============================================================================
// Processing Defaults
// =============================================================================

/// Minimum concentration counted as ice extent
pub const EXTENT_THRESHOLD: f64 = 15.0;

/// Daily files required before a daily-derived month is considered valid
pub const MINIMUM_DAYS_FOR_VALID_MONTH: usize = 20;

/// Directory listings retained by the locator cache
pub const DEFAULT_LISTING_CACHE_CAPACITY: usize = 4;

/// Significance cutoff for the per-cell trend F-test
pub const MAXIMUM_F_TEST_P_VALUE: f64 = 0.05;

/// Trend years with fewer nonzero-weight points resolve to zero
pub const MINIMUM_TREND_POINTS: usize = 3;

/// Default filesystem roots for final and near-real-time archives
pub const DEFAULT_FINAL_SEA_ICE_PATHS: &[&str] = &["/share/data/seaice/nsidc-0051"];
pub const DEFAULT_NRT_SEA_ICE_PATHS: &[&str] = &["/share/data/seaice/nsidc-0081"];

/// Environment variable naming a JSON config override file
pub const CONFIG_ENV_VAR: &str = "SEAICE_CONFIG";

/// Standard three-month seasons
pub const SEASONS: &[(&str, [u32; 3])] = &[
    ("spring", [3, 4, 5]),
    ("summer", [6, 7, 8]),
    ("autumn", [9, 10, 11]),
    ("winter", [12, 1, 2]),
];
