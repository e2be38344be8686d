//! Structured source filenames.
//!
//! All arbitration is driven by the filename: date or year-month, platform,
//! version tag and hemisphere letter. File contents are never consulted.

use crate::constants::NRT_VERSION_TAG;
use crate::error::{Result, SeaIceError};
use crate::models::{Hemisphere, Period};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn filename_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"nt_(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})?_(?P<platform>[nf]\d{2})_(?P<version>nrt|v01|v1\.1)_(?P<hemisphere>[ns])\.bin$",
            )
            .ok()
        })
        .as_ref()
}

/// A recognized source file and the fields parsed from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub period: Period,
    pub platform: String,
    pub version: String,
    pub hemisphere: Hemisphere,
}

impl SourceFile {
    /// Parse a path, returning `None` for names outside the convention
    pub fn parse(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let caps = filename_pattern()?.captures(name)?;

        let year: i32 = caps.name("year")?.as_str().parse().ok()?;
        let month: u32 = caps.name("month")?.as_str().parse().ok()?;
        let period = match caps.name("day") {
            Some(day) => Period::Day(NaiveDate::from_ymd_opt(year, month, day.as_str().parse().ok()?)?),
            None if (1..=12).contains(&month) => Period::month_of(year, month),
            None => return None,
        };

        Some(Self {
            path: path.to_path_buf(),
            period,
            platform: caps.name("platform")?.as_str().to_string(),
            version: caps.name("version")?.as_str().to_string(),
            hemisphere: Hemisphere::from_name(caps.name("hemisphere")?.as_str())?,
        })
    }

    pub fn is_nrt(&self) -> bool {
        self.version == NRT_VERSION_TAG
    }

    pub fn is_daily(&self) -> bool {
        self.period.is_daily()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.period.date()
    }
}

/// Period encoded in a single filename
pub fn period_from_path(path: &Path) -> Result<Period> {
    SourceFile::parse(path)
        .map(|file| file.period)
        .ok_or_else(|| SeaIceError::FilenameNotRecognized {
            path: path.to_path_buf(),
        })
}

/// Periods for a file list, which must not mix daily and monthly names
pub fn periods_from_paths(paths: &[PathBuf]) -> Result<Vec<Period>> {
    let periods = paths
        .iter()
        .map(|path| period_from_path(path))
        .collect::<Result<Vec<_>>>()?;

    let daily = periods.iter().filter(|p| p.is_daily()).count();
    if daily != 0 && daily != periods.len() {
        return Err(SeaIceError::AmbiguousPeriods {
            files: paths.to_vec(),
        });
    }
    Ok(periods)
}
