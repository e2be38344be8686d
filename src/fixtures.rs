//! Synthetic archives for unit tests.
//!
//! Writes real binary grid files with a tiny 2x3 shape into a temporary
//! directory so the locator, reader and builder run end to end.

use crate::builder::GridsetBuilder;
use crate::config::{SearchPaths, SeaIceConfig};
use crate::locator::FileLocator;
use crate::models::Hemisphere;
use crate::reader::write_grid_file;
use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const SHAPE: (usize, usize) = (2, 3);

pub const POLE: u8 = 251;
pub const COAST: u8 = 253;
pub const LAND: u8 = 254;
pub const MISSING: u8 = 255;

/// Date pinned as today by test builders
pub const TODAY: (i32, u32, u32) = (2021, 6, 15);

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Grid with every cell set to `code`
pub fn uniform(code: u8) -> Array2<u8> {
    Array2::from_elem(SHAPE, code)
}

/// Grid from six row-major codes
pub fn codes(values: [u8; 6]) -> Array2<u8> {
    Array2::from_shape_vec(SHAPE, values.to_vec()).unwrap()
}

pub struct Archive {
    dir: TempDir,
}

impl Archive {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn search_paths(&self) -> SearchPaths {
        SearchPaths::new([self.root()])
    }

    fn hemisphere_letter(hemisphere: Hemisphere) -> &'static str {
        match hemisphere {
            Hemisphere::North => "n",
            Hemisphere::South => "s",
        }
    }

    pub fn daily(
        &self,
        hemisphere: Hemisphere,
        date: NaiveDate,
        platform: &str,
        version: &str,
        raw: &Array2<u8>,
    ) -> PathBuf {
        let name = format!(
            "nt_{}_{}_{}_{}.bin",
            date.format("%Y%m%d"),
            platform,
            version,
            Self::hemisphere_letter(hemisphere)
        );
        let path = self
            .root()
            .join(hemisphere.long_name())
            .join("daily")
            .join(date.year().to_string())
            .join(name);
        write_grid_file(&path, raw).unwrap();
        path
    }

    pub fn monthly(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        platform: &str,
        version: &str,
        raw: &Array2<u8>,
    ) -> PathBuf {
        let name = format!(
            "nt_{year:04}{month:02}_{platform}_{version}_{}.bin",
            Self::hemisphere_letter(hemisphere)
        );
        let path = self
            .root()
            .join(hemisphere.long_name())
            .join("monthly")
            .join(name);
        write_grid_file(&path, raw).unwrap();
        path
    }

    /// Write one final file per day in the inclusive range
    pub fn daily_range(
        &self,
        hemisphere: Hemisphere,
        start: NaiveDate,
        end: NaiveDate,
        platform: &str,
        raw: &Array2<u8>,
    ) -> Vec<PathBuf> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| self.daily(hemisphere, date, platform, "v1.1", raw))
            .collect()
    }
}

/// Small-grid config searching only the given archive
pub fn config_for(archive: &Archive) -> SeaIceConfig {
    SeaIceConfig::default()
        .with_shape(SHAPE)
        .with_search_paths(archive.search_paths(), SearchPaths::default())
        .with_min_days_for_valid_month(2)
        .with_workers(2)
}

pub fn shared_config_for(archive: &Archive) -> Arc<SeaIceConfig> {
    Arc::new(config_for(archive))
}

/// Builder over the archive with today pinned to [`TODAY`]
pub fn builder_for(archive: &Archive) -> GridsetBuilder {
    builder_with(shared_config_for(archive))
}

pub fn builder_with(config: Arc<SeaIceConfig>) -> GridsetBuilder {
    let locator = Arc::new(FileLocator::new(config.clone()).unwrap());
    let (year, month, day) = TODAY;
    GridsetBuilder::new(config, locator).with_today(ymd(year, month, day))
}
