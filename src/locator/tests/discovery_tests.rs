//! Directory walking and listing cache behavior

use crate::config::SearchPaths;
use crate::fixtures::{Archive, shared_config_for, uniform, ymd};
use crate::locator::FileLocator;
use crate::models::Hemisphere;
use std::fs;

#[test]
fn test_listing_finds_nested_files_and_ignores_others() {
    let archive = Archive::new();
    archive.daily(Hemisphere::North, ymd(2010, 1, 1), "f17", "v1.1", &uniform(10));
    archive.monthly(Hemisphere::North, 2010, 1, "f17", "v1.1", &uniform(10));
    fs::write(archive.root().join("north").join("README.txt"), "notes").unwrap();
    fs::write(archive.root().join("nt_badname.bin"), "junk").unwrap();

    let locator = FileLocator::new(shared_config_for(&archive)).unwrap();
    let listing = locator.listing(&archive.search_paths()).unwrap();

    assert_eq!(listing.len(), 2);
}

#[test]
fn test_missing_roots_contribute_nothing() {
    let archive = Archive::new();
    let locator = FileLocator::new(shared_config_for(&archive)).unwrap();
    let roots = SearchPaths::new([archive.root().join("does-not-exist")]);
    assert!(locator.listing(&roots).unwrap().is_empty());
}

#[test]
fn test_listing_is_cached_until_invalidated() {
    let archive = Archive::new();
    archive.daily(Hemisphere::North, ymd(2010, 1, 1), "f17", "v1.1", &uniform(10));

    let locator = FileLocator::new(shared_config_for(&archive)).unwrap();
    let roots = archive.search_paths();
    assert_eq!(locator.listing(&roots).unwrap().len(), 1);

    archive.daily(Hemisphere::North, ymd(2010, 1, 2), "f17", "v1.1", &uniform(10));
    assert_eq!(locator.listing(&roots).unwrap().len(), 1);

    let stats = locator.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);

    locator.invalidate();
    assert_eq!(locator.listing(&roots).unwrap().len(), 2);
}
