//! Bounded cache of parsed directory listings.

use super::filename::SourceFile;
use crate::config::SearchPaths;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Parsed files under one set of search roots
pub type Listing = Arc<Vec<SourceFile>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// LRU cache keyed on the search root set.
///
/// Entries are never refreshed automatically; callers that change the
/// filesystem must call [`ListingCache::invalidate`].
pub struct ListingCache {
    cache: LruCache<SearchPaths, Listing>,
    hits: u64,
    misses: u64,
}

impl ListingCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, roots: &SearchPaths) -> Option<Listing> {
        match self.cache.get(roots) {
            Some(listing) => {
                self.hits += 1;
                debug!("Listing cache hit for {:?}", roots.roots());
                Some(Arc::clone(listing))
            }
            None => {
                self.misses += 1;
                debug!("Listing cache miss for {:?}", roots.roots());
                None
            }
        }
    }

    pub fn insert(&mut self, roots: SearchPaths, listing: Listing) {
        self.cache.put(roots, listing);
    }

    /// Drop every cached listing
    pub fn invalidate(&mut self) {
        debug!("Invalidating {} cached listings", self.cache.len());
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Arc::new(Vec::new())
    }

    #[test]
    fn test_hits_and_misses_are_counted() {
        let mut cache = ListingCache::new(NonZeroUsize::new(2).unwrap());
        let roots = SearchPaths::new(["/a"]);
        assert!(cache.get(&roots).is_none());
        cache.insert(roots.clone(), listing());
        assert!(cache.get(&roots).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let mut cache = ListingCache::new(NonZeroUsize::new(2).unwrap());
        for root in ["/a", "/b", "/c"] {
            cache.insert(SearchPaths::new([root]), listing());
        }
        assert_eq!(cache.stats().entries, 2);
        assert!(cache.get(&SearchPaths::new(["/a"])).is_none());
    }

    #[test]
    fn test_invalidate_clears_entries() {
        let mut cache = ListingCache::new(NonZeroUsize::new(2).unwrap());
        cache.insert(SearchPaths::new(["/a"]), listing());
        cache.invalidate();
        assert_eq!(cache.stats().entries, 0);
    }
}
