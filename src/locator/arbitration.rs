//! Source arbitration rules.
//!
//! When several files describe the same period, platform preference picks
//! the sensor and final/NRT arbitration picks the processing generation.
//! Final files for the same period from different roots or versions are
//! all kept; each contributes its own layer.

use super::filename::SourceFile;
use crate::config::SeaIceConfig;
use crate::models::Period;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;

/// Date a file is judged by when checking platform preference
fn reference_date(file: &SourceFile, config: &SeaIceConfig) -> Option<NaiveDate> {
    match file.period {
        Period::Day(date) => Some(date),
        Period::Month { year, month } => {
            NaiveDate::from_ymd_opt(year, month, config.monthly_platform_reference_day)
        }
    }
}

/// Keep only files whose platform is preferred on their reference date
pub fn filter_preferred_platforms(files: Vec<SourceFile>, config: &SeaIceConfig) -> Vec<SourceFile> {
    files
        .into_iter()
        .filter(|file| {
            reference_date(file, config)
                .is_some_and(|date| config.is_preferred_platform(&file.platform, date))
        })
        .collect()
}

/// Final files win on or before the final-data cutoff; NRT files fill the
/// dates no final file covers.
pub fn filter_final_over_nrt(files: Vec<SourceFile>, config: &SeaIceConfig) -> Vec<SourceFile> {
    let cutoff = config.last_day_with_valid_final_data;
    let (nrt, finals): (Vec<SourceFile>, Vec<SourceFile>) =
        files.into_iter().partition(SourceFile::is_nrt);

    let finals: Vec<SourceFile> = finals
        .into_iter()
        .filter(|file| period_end(&file.period).is_some_and(|end| end <= cutoff))
        .collect();
    let final_periods: HashSet<Period> = finals.iter().map(|file| file.period).collect();

    let mut kept = finals;
    kept.extend(
        nrt.into_iter()
            .filter(|file| !final_periods.contains(&file.period)),
    );
    kept
}

fn period_end(period: &Period) -> Option<NaiveDate> {
    match period {
        Period::Day(date) => Some(*date),
        Period::Month { year, month } => crate::calendar::last_day_of_month(*year, *month).ok(),
    }
}

/// Repeat SMMR paths so averages weight their every-other-day coverage as daily
pub fn double_weight_smmr(files: &[SourceFile], config: &SeaIceConfig) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        paths.push(file.path.clone());
        if config.is_smmr(&file.platform) {
            paths.push(file.path.clone());
        }
    }
    paths
}

/// Order by period start, then path
pub fn sort_chronologically(files: &mut [SourceFile]) {
    files.sort_by(|a, b| {
        period_key(&a.period)
            .cmp(&period_key(&b.period))
            .then_with(|| a.path.cmp(&b.path))
    });
}

fn period_key(period: &Period) -> (i32, u32, u32) {
    match period {
        Period::Day(date) => {
            use chrono::Datelike;
            (date.year(), date.month(), date.day())
        }
        Period::Month { year, month } => (*year, *month, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn file(name: &str) -> SourceFile {
        SourceFile::parse(Path::new(name)).unwrap()
    }

    fn names(files: &[SourceFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_repeated_final_files_are_all_kept() {
        let config = SeaIceConfig::default();
        let files = vec![
            file("/a/nt_19871015_f08_v1.1_n.bin"),
            file("/b/nt_19871015_f08_v1.1_n.bin"),
            file("/a/nt_19871015_f08_v01_n.bin"),
            file("/a/nt_19871015_f08_nrt_n.bin"),
        ];
        let kept = filter_final_over_nrt(files, &config);
        assert_eq!(
            names(&kept),
            vec![
                "/a/nt_19871015_f08_v1.1_n.bin",
                "/b/nt_19871015_f08_v1.1_n.bin",
                "/a/nt_19871015_f08_v01_n.bin",
            ]
        );
    }

    #[test]
    fn test_platform_preference_by_date() {
        let config = SeaIceConfig::default();
        let files = vec![
            file("nt_19870820_n07_v1.1_n.bin"),
            file("nt_19870820_f08_v1.1_n.bin"),
            file("nt_19870821_n07_v1.1_n.bin"),
            file("nt_19870821_f08_v1.1_n.bin"),
        ];
        let kept = filter_preferred_platforms(files, &config);
        assert_eq!(
            names(&kept),
            vec!["nt_19870820_n07_v1.1_n.bin", "nt_19870821_f08_v1.1_n.bin"]
        );
    }

    #[test]
    fn test_monthly_files_judged_on_the_fifteenth() {
        let config = SeaIceConfig::default();
        let files = vec![
            file("nt_199112_f08_v1.1_n.bin"),
            file("nt_199112_f11_v1.1_n.bin"),
        ];
        let kept = filter_preferred_platforms(files, &config);
        assert_eq!(names(&kept), vec!["nt_199112_f08_v1.1_n.bin"]);
    }

    #[test]
    fn test_unpreferred_only_candidates_are_dropped() {
        let config = SeaIceConfig::default();
        let kept = filter_preferred_platforms(vec![file("nt_20100101_f13_v1.1_n.bin")], &config);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_final_preferred_until_cutoff() {
        let config = SeaIceConfig::default();
        let files = vec![
            file("nt_20181231_f17_v1.1_n.bin"),
            file("nt_20181231_f17_nrt_n.bin"),
            file("nt_20190101_f17_v1.1_n.bin"),
            file("nt_20190101_f18_nrt_n.bin"),
            file("nt_20181230_f17_nrt_n.bin"),
        ];
        let mut kept = filter_final_over_nrt(files, &config);
        sort_chronologically(&mut kept);
        assert_eq!(
            names(&kept),
            vec![
                "nt_20181230_f17_nrt_n.bin",
                "nt_20181231_f17_v1.1_n.bin",
                "nt_20190101_f18_nrt_n.bin",
            ]
        );
    }

    #[test]
    fn test_smmr_paths_repeat_once() {
        let config = SeaIceConfig::default();
        let files = vec![
            file("nt_19870818_n07_v1.1_n.bin"),
            file("nt_19870821_f08_v1.1_n.bin"),
        ];
        let paths = double_weight_smmr(&files, &config);
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], paths[1]);
    }
}
