//! Sea Ice Data Library
//!
//! A Rust library for retrieving gridded passive-microwave sea ice
//! concentration archives and normalizing them into analysis-ready gridsets.
//!
//! This library provides tools for:
//! - Locating daily and monthly source files across final and near-real-time
//!   archives, with platform and version arbitration
//! - Decoding the fixed-header binary grids into scaled concentration
//! - Building daily, date-range, monthly and seasonal composites that keep
//!   land, coast and pole-hole flags intact
//! - Filtering with land removal, bad dates, interpolation and invalid-ice
//!   masks applied in one fixed order
//! - Extent thresholds, multi-year extent medians and monthly anomalies
//! - Variability-weighted decadal trends fitted per cell on a worker pool
//!
//! Most callers only need [`GridsetService`] and the option structs.

pub mod builder;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod error;
pub mod external;
pub mod filters;
pub mod gridset;
pub mod locator;
pub mod models;
pub mod parallel;
pub mod reader;
pub mod reduction;
pub mod service;
pub mod trend;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use config::{GridSpec, SearchPaths, SeaIceConfig};
pub use error::{Result, SeaIceError};
pub use external::{BadDateList, BadDateSource, InMemoryInvalidIceMasks, InvalidIceMaskSource};
pub use gridset::{GridData, Gridset, Metadata, Product, Provenance};
pub use models::{Hemisphere, Period, Temporality, ValidRange};
pub use service::{AverageOptions, DailyMedianOptions, DailyOptions, GridsetService, MonthlyOptions};
