//! Source file discovery and arbitration.
//!
//! Walks the configured search roots for concentration files, caches the
//! parsed listing and answers per-date and per-month queries with exactly
//! the files authoritative for them.
//!
//! Archives are laid out loosely; any directory depth is accepted:
//! ```text
//! nsidc-0051/
//!   north/
//!     daily/1987/nt_19871015_f08_v1.1_n.bin
//!     monthly/nt_198710_f08_v1.1_n.bin
//! nsidc-0081/
//!   north/daily/nt_20190101_f18_nrt_n.bin
//! ```

pub mod arbitration;
pub mod cache;
pub mod filename;

#[cfg(test)]
pub mod tests;

pub use cache::CacheStats;
pub use filename::{SourceFile, period_from_path, periods_from_paths};

use self::arbitration::{
    double_weight_smmr, filter_final_over_nrt, filter_preferred_platforms, sort_chronologically,
};
use self::cache::{Listing, ListingCache};
use crate::calendar::{first_day_of_month, last_day_of_month};
use crate::config::{SearchPaths, SeaIceConfig};
use crate::constants::{FILENAME_EXTENSION, FILENAME_GLOB_INFIX};
use crate::error::{Result, SeaIceError};
use crate::models::{Hemisphere, Period};
use chrono::NaiveDate;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Locates authoritative source files beneath a set of search roots
pub struct FileLocator {
    config: Arc<SeaIceConfig>,
    cache: Mutex<ListingCache>,
}

impl FileLocator {
    pub fn new(config: Arc<SeaIceConfig>) -> Result<Self> {
        let capacity =
            NonZeroUsize::new(config.listing_cache_capacity).ok_or_else(|| SeaIceError::Configuration {
                message: "listing_cache_capacity must be at least 1".to_string(),
            })?;
        Ok(Self {
            config,
            cache: Mutex::new(ListingCache::new(capacity)),
        })
    }

    pub fn config(&self) -> &SeaIceConfig {
        &self.config
    }

    fn cache(&self) -> MutexGuard<'_, ListingCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forget cached listings so the next query rescans the filesystem
    pub fn invalidate(&self) {
        self.cache().invalidate();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Every recognized file under `roots`, from cache when possible
    pub fn listing(&self, roots: &SearchPaths) -> Result<Listing> {
        if let Some(listing) = self.cache().get(roots) {
            return Ok(listing);
        }

        let listing: Listing = Arc::new(scan_roots(roots)?);
        info!(
            "Indexed {} concentration files under {} search roots",
            listing.len(),
            roots.roots().len()
        );
        self.cache().insert(roots.clone(), Arc::clone(&listing));
        Ok(listing)
    }

    /// Arbitrated daily files in an inclusive date range, chronologically
    pub fn daily_files(
        &self,
        hemisphere: Hemisphere,
        start: NaiveDate,
        end: NaiveDate,
        roots: &SearchPaths,
    ) -> Result<Vec<SourceFile>> {
        let listing = self.listing(roots)?;
        let candidates: Vec<SourceFile> = listing
            .iter()
            .filter(|file| file.hemisphere == hemisphere)
            .filter(|file| file.date().is_some_and(|date| start <= date && date <= end))
            .cloned()
            .collect();

        let mut files = filter_final_over_nrt(
            filter_preferred_platforms(candidates, &self.config),
            &self.config,
        );
        sort_chronologically(&mut files);

        debug!(
            "Located {} daily files for {} between {} and {}",
            files.len(),
            hemisphere,
            start,
            end
        );
        Ok(files)
    }

    /// One path per date in the range, without SMMR double weighting
    pub fn daily_file_paths(
        &self,
        hemisphere: Hemisphere,
        start: NaiveDate,
        end: NaiveDate,
        roots: &SearchPaths,
    ) -> Result<Vec<PathBuf>> {
        Ok(self
            .daily_files(hemisphere, start, end, roots)?
            .into_iter()
            .map(|file| file.path)
            .collect())
    }

    /// Paths in the range with SMMR files listed twice
    pub fn weighted_daily_file_paths(
        &self,
        hemisphere: Hemisphere,
        start: NaiveDate,
        end: NaiveDate,
        roots: &SearchPaths,
    ) -> Result<Vec<PathBuf>> {
        let files = self.daily_files(hemisphere, start, end, roots)?;
        Ok(double_weight_smmr(&files, &self.config))
    }

    pub fn weighted_daily_file_paths_for_month(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        roots: &SearchPaths,
    ) -> Result<Vec<PathBuf>> {
        let start = first_day_of_month(year, month)?;
        let end = last_day_of_month(year, month)?;
        self.weighted_daily_file_paths(hemisphere, start, end, roots)
    }

    /// The single monthly file for a year-month, if any
    pub fn monthly_file_path(
        &self,
        hemisphere: Hemisphere,
        year: i32,
        month: u32,
        roots: &SearchPaths,
    ) -> Result<Option<PathBuf>> {
        let listing = self.listing(roots)?;
        let target = Period::month_of(year, month);
        let candidates: Vec<SourceFile> = listing
            .iter()
            .filter(|file| file.hemisphere == hemisphere && file.period == target)
            .cloned()
            .collect();

        let mut files = filter_final_over_nrt(
            filter_preferred_platforms(candidates, &self.config),
            &self.config,
        );
        sort_chronologically(&mut files);
        Ok(files.into_iter().next().map(|file| file.path))
    }

    /// True if the path names a file from the SMMR platform
    pub fn is_smmr_path(&self, path: &Path) -> bool {
        SourceFile::parse(path).is_some_and(|file| self.config.is_smmr(&file.platform))
    }
}

/// Walk every root for recognized concentration files, sorted by path.
/// Missing roots contribute nothing.
fn scan_roots(roots: &SearchPaths) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for root in roots.roots() {
        if !root.exists() {
            debug!("Skipping missing search root {}", root.display());
            continue;
        }
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() || !looks_like_source_file(entry.path()) {
                continue;
            }
            if let Some(file) = SourceFile::parse(entry.path()) {
                files.push(file);
            }
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

fn looks_like_source_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains(FILENAME_GLOB_INFIX));
    named && path.extension().is_some_and(|ext| ext == FILENAME_EXTENSION)
}
