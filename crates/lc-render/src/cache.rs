//! Bounded LRU cache of decoded rasters, keyed by source reference.
//!
//! Each key owns a `tokio::sync::OnceCell`, so concurrent requests for the
//! same source share one fetch/decode. Failed loads leave the cell empty and
//! are dropped from the cache, so the next request retries.

use crate::raster::{Fetch, FsFetch, RasterError, load_pixmap};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tiny_skia::Pixmap;
use tokio::sync::OnceCell;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

type Slot = Arc<OnceCell<Arc<Pixmap>>>;

#[derive(Default)]
struct Entries {
    slots: HashMap<String, Slot>,
    /// Least recently used first.
    order: VecDeque<String>,
}

impl Entries {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.to_string());
    }

    fn evict_to(&mut self, capacity: usize) {
        while self.slots.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            log::trace!("evicting raster {}", abbreviate(&oldest));
            self.slots.remove(&oldest);
        }
    }

    fn remove(&mut self, key: &str) {
        self.slots.remove(key);
        self.order.retain(|k| k != key);
    }
}

pub struct RasterCache<F = FsFetch> {
    fetch: F,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl RasterCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_fetch(FsFetch, capacity)
    }
}

impl<F: Fetch> RasterCache<F> {
    pub fn with_fetch(fetch: F, capacity: usize) -> Self {
        Self {
            fetch,
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `src`, loading it at most once while it stays cached.
    pub async fn resolve(&self, src: &str) -> Result<Arc<Pixmap>, RasterError> {
        let slot = {
            let mut entries = self.lock();
            let slot = entries
                .slots
                .entry(src.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            entries.touch(src);
            entries.evict_to(self.capacity);
            slot
        };

        let result = slot
            .get_or_try_init(|| async {
                log::debug!("loading raster {}", abbreviate(src));
                load_pixmap(&self.fetch, src).await.map(Arc::new)
            })
            .await
            .cloned();

        if let Err(e) = &result {
            log::warn!("raster {} failed to load: {e}", abbreviate(src));
            let mut entries = self.lock();
            if entries
                .slots
                .get(src)
                .is_some_and(|s| Arc::ptr_eq(s, &slot) && s.get().is_none())
            {
                entries.remove(src);
            }
        }
        result
    }

    /// A cached, already decoded raster. Never triggers a load.
    pub fn get(&self, src: &str) -> Option<Arc<Pixmap>> {
        let mut entries = self.lock();
        let pixmap = entries.slots.get(src)?.get().cloned()?;
        entries.touch(src);
        Some(pixmap)
    }

    /// Seed the cache with a raster decoded elsewhere.
    pub fn insert(&self, src: impl Into<String>, pixmap: Arc<Pixmap>) {
        let src = src.into();
        let mut entries = self.lock();
        let cell = OnceCell::new_with(Some(pixmap));
        entries.slots.insert(src.clone(), Arc::new(cell));
        entries.touch(&src);
        entries.evict_to(self.capacity);
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.slots.clear();
        entries.order.clear();
    }
}

/// Inline payloads make for unreadable log lines.
fn abbreviate(src: &str) -> &str {
    match src.char_indices().nth(48) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::tests::{solid_png, solid_png_data_url};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves a 2×2 PNG for any locator except `missing`, counting calls.
    #[derive(Default)]
    struct CountingFetch {
        calls: AtomicUsize,
    }

    impl Fetch for CountingFetch {
        async fn fetch(&self, locator: &str) -> Result<Vec<u8>, RasterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if locator == "missing" {
                return Err(RasterError::Io {
                    locator: locator.to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(solid_png(2, 2, [255, 0, 0, 255]))
        }
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_load() {
        let cache = RasterCache::with_fetch(CountingFetch::default(), 8);
        let (a, b, c) = tokio::join!(cache.resolve("x"), cache.resolve("x"), cache.resolve("x"));
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(cache.fetch.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = RasterCache::with_fetch(CountingFetch::default(), 8);
        assert!(cache.resolve("missing").await.is_err());
        assert!(cache.is_empty());
        assert!(cache.resolve("missing").await.is_err());
        assert_eq!(cache.fetch.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn least_recently_used_is_evicted() {
        let cache = RasterCache::with_fetch(CountingFetch::default(), 2);
        cache.resolve("a").await.unwrap();
        cache.resolve("b").await.unwrap();
        // Touch `a` so `b` becomes the oldest.
        assert!(cache.get("a").is_some());
        cache.resolve("c").await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test]
    async fn data_urls_go_through_the_same_cache() {
        let cache = RasterCache::with_fetch(CountingFetch::default(), 4);
        let url = solid_png_data_url(3, 3, [0, 255, 0, 255]);
        let first = cache.resolve(&url).await.unwrap();
        let second = cache.resolve(&url).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.fetch.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inserted_rasters_are_served() {
        let cache = RasterCache::new(4);
        let pixmap = Arc::new(Pixmap::new(1, 1).unwrap());
        cache.insert("seed", pixmap.clone());
        assert!(Arc::ptr_eq(&cache.get("seed").unwrap(), &pixmap));
        cache.clear();
        assert!(cache.get("seed").is_none());
    }

    #[test]
    fn abbreviates_long_sources() {
        assert_eq!(abbreviate("short"), "short");
        assert_eq!(abbreviate(&"x".repeat(100)).len(), 48);
    }
}
