//! Memo Cache Module
//!
//! Thread-safe handle over [`CacheStore`] shared by request handlers, the
//! admission gate and the background sweep.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::cache::{CacheConfig, CacheStats, CacheStore, Category, EntryInfo, SweepReport};
use crate::clock::Clock;

// == Memo Cache ==
/// Cloneable handle to one cache store guarded by a single mutex.
///
/// Every operation takes the lock for a bounded in-memory computation and
/// copies values out; callers never hold references into the store.
#[derive(Debug, Clone)]
pub struct MemoCache {
    store: Arc<Mutex<CacheStore>>,
}

impl MemoCache {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_store(CacheStore::new(config, clock))
    }

    pub fn from_store(store: CacheStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn get(&self, category: Category, content: &Value) -> Option<Value> {
        self.store.lock().get(category, content)
    }

    pub fn set(
        &self,
        category: Category,
        content: &Value,
        value: Value,
        ttl_override: Option<u64>,
    ) -> bool {
        self.store.lock().set(category, content, value, ttl_override)
    }

    pub fn invalidate(&self, category: Category, content: &Value) -> bool {
        self.store.lock().invalidate(category, content)
    }

    pub fn clear(&self, category: Option<Category>) -> usize {
        self.store.lock().clear(category)
    }

    pub fn entry_info(&self, category: Category, content: &Value) -> Option<EntryInfo> {
        self.store.lock().entry_info(category, content)
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Runs one expiry and memory-pressure sweep.
    pub fn sweep(&self) -> SweepReport {
        self.store.lock().sweep()
    }

    // == Typed Helpers ==
    /// Caches the credibility report produced for a piece of news text.
    pub fn cache_analysis(&self, content: &str, report: &str) -> bool {
        self.set(Category::Analysis, &Value::from(content), Value::from(report), None)
    }

    pub fn cached_analysis(&self, content: &str) -> Option<String> {
        self.get(Category::Analysis, &Value::from(content))
            .and_then(|value| value.as_str().map(str::to_owned))
    }

    pub fn cache_search_results(&self, query: &str, results: Value) -> bool {
        self.set(Category::SearchResults, &Value::from(query), results, None)
    }

    pub fn cached_search_results(&self, query: &str) -> Option<Value> {
        self.get(Category::SearchResults, &Value::from(query))
    }

    pub fn cache_url_content(&self, url: &str, text: &str) -> bool {
        self.set(Category::UrlContent, &Value::from(url), Value::from(text), None)
    }

    pub fn cached_url_content(&self, url: &str) -> Option<String> {
        self.get(Category::UrlContent, &Value::from(url))
            .and_then(|value| value.as_str().map(str::to_owned))
    }

    pub fn cache_source_verification(&self, source: &Value, verification: Value) -> bool {
        self.set(Category::SourceVerification, source, verification, None)
    }

    pub fn cached_source_verification(&self, source: &Value) -> Option<Value> {
        self.get(Category::SourceVerification, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::thread;

    fn memo(limit_bytes: usize) -> (MemoCache, ManualClock) {
        let clock = ManualClock::new(0);
        let cache = MemoCache::new(
            CacheConfig::with_limit_bytes(limit_bytes),
            Arc::new(clock.clone()),
        );
        (cache, clock)
    }

    #[test]
    fn test_clones_share_store() {
        let (cache, _) = memo(10_000);
        let other = cache.clone();

        cache.set(Category::Default, &json!("k"), json!("v"), None);
        assert_eq!(other.get(Category::Default, &json!("k")), Some(json!("v")));
    }

    #[test]
    fn test_typed_helpers() {
        let (cache, _) = memo(10_000);

        assert!(cache.cache_analysis("breaking news", "Credibility: 72%"));
        assert_eq!(
            cache.cached_analysis("breaking news").as_deref(),
            Some("Credibility: 72%")
        );

        cache.cache_url_content("https://example.com", "article body");
        assert_eq!(
            cache.cached_url_content("https://example.com").as_deref(),
            Some("article body")
        );
        assert!(cache.cached_analysis("https://example.com").is_none());

        cache.cache_search_results("query", json!({"items": [1, 2]}));
        assert_eq!(
            cache.cached_search_results("query"),
            Some(json!({"items": [1, 2]}))
        );

        let source = json!({"domain": "example.com", "kind": "news"});
        cache.cache_source_verification(&source, json!({"trusted": false}));
        assert_eq!(
            cache.cached_source_verification(&json!({"kind": "news", "domain": "example.com"})),
            Some(json!({"trusted": false}))
        );
    }

    #[test]
    fn test_sweep_through_handle() {
        let (cache, clock) = memo(10_000);

        cache.set(Category::Default, &json!("k"), json!("v"), Some(1));
        clock.advance_secs(5);

        assert_eq!(cache.sweep().expired, 1);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_concurrent_sets_respect_budget() {
        let (cache, _) = memo(4_000);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let content = json!(format!("{}-{}", t, i));
                        cache.set(Category::Default, &content, json!("x".repeat(100)), None);
                        cache.get(Category::Default, &content);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert!(stats.used_bytes <= stats.limit_bytes);
        assert_eq!(stats.used_bytes, stats.total_entries * 100);
        assert_eq!(stats.sets, 400);
    }
}
