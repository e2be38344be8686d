//! Shared helpers for integration tests.
//!
//! Archives are written to temporary directories using the crate's own grid
//! encoder so that every test exercises the real discovery and decoding path.

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use seaice_data::reader::write_grid_file;
use seaice_data::{Hemisphere, SearchPaths, SeaIceConfig};
use std::path::PathBuf;
use tempfile::TempDir;

pub const SHAPE: (usize, usize) = (2, 3);
pub const LAND: u8 = 254;

/// Route library logging to the test harness; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn uniform(code: u8) -> Array2<u8> {
    Array2::from_elem(SHAPE, code)
}

/// One archive root on disk
pub struct ArchiveDir {
    dir: TempDir,
}

impl ArchiveDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    fn letter(hemisphere: Hemisphere) -> &'static str {
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
            "nt_{}_{platform}_{version}_{}.bin",
            date.format("%Y%m%d"),
            Self::letter(hemisphere)
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
            Self::letter(hemisphere)
        );
        let path = self
            .root()
            .join(hemisphere.long_name())
            .join("monthly")
            .join(name);
        write_grid_file(&path, raw).unwrap();
        path
    }
}

/// Config loaded from JSON the way deployments supply it, pointed at a
/// final and a near-real-time archive
pub fn config_for(final_archive: &ArchiveDir, nrt_archive: &ArchiveDir) -> SeaIceConfig {
    let json = serde_json::json!({
        "final_search_paths": [final_archive.root()],
        "nrt_search_paths": [nrt_archive.root()],
        "min_days_for_valid_month": 2,
        "workers": 2,
    });
    SeaIceConfig::from_json_str(&json.to_string())
        .unwrap()
        .with_shape(SHAPE)
}

pub fn search_paths(archives: &[&ArchiveDir]) -> SearchPaths {
    SearchPaths::new(archives.iter().map(|archive| archive.root()))
}
