pub mod daily_tests;

use super::GridsetService;
use crate::config::SeaIceConfig;
use crate::fixtures::{Archive, TODAY, config_for, ymd};

/// Service over the archive with today pinned
pub fn service_for(archive: &Archive) -> GridsetService {
    service_with(config_for(archive))
}

pub fn service_with(config: SeaIceConfig) -> GridsetService {
    let (year, month, day) = TODAY;
    GridsetService::new(config)
        .unwrap()
        .with_today(ymd(year, month, day))
}
