//! Error handling for sea ice gridset retrieval.
//!
//! Provides error types with context for request validation, source file
//! parsing, provenance inference and gridset filtering failures.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeaIceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory traversal failed: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Worker pool could not be built: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Configuration parse error: {0}")]
    ConfigurationParse(#[from] serde_json::Error),

    #[error("Date {date} is outside the supported range")]
    DateOutOfRange { date: NaiveDate },

    #[error("Year-month {year:04}-{month:02} is outside the supported range or not yet complete")]
    YearMonthOutOfRange { year: i32, month: u32 },

    #[error("No data available for the requested gridset")]
    NoData,

    #[error("Incomplete month {year:04}-{month:02}: expected {expected} daily grids, found {found}")]
    IncompleteMonth {
        year: i32,
        month: u32,
        expected: usize,
        found: usize,
    },

    #[error("Invalid search paths: {message}")]
    InvalidSearchPaths { message: String },

    #[error("Could not infer a single period granularity from files: {files:?}")]
    AmbiguousPeriods { files: Vec<PathBuf> },

    #[error("No source file found for target date {date}")]
    IndexNotFound { date: NaiveDate },

    #[error("Invalid grid header in file: {path} - {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("Truncated grid in file: {path} - expected {expected} cells, found {found}")]
    TruncatedGrid {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Grid shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Filename not recognized as a concentration file: {path}")]
    FilenameNotRecognized { path: PathBuf },

    #[error("Bad season definition: {message}")]
    BadSeason { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Regression failed: {message}")]
    Regression { message: String },
}

impl SeaIceError {
    /// True for the family that batch layers recover from by skipping the
    /// unit of work or substituting a placeholder. A month that is not yet
    /// complete belongs here as well as a month with too few files.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            SeaIceError::NoData
                | SeaIceError::YearMonthOutOfRange { .. }
                | SeaIceError::IncompleteMonth { .. }
        )
    }

    /// True when the request itself fell outside the supported calendar.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            SeaIceError::DateOutOfRange { .. } | SeaIceError::YearMonthOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SeaIceError>;
